//! Line-delimited JSON front end for a [`Session`]
//!
//! Reads one request per line and writes one response per line until the
//! input closes. Pipeline failures are ordinary text results; only protocol
//! problems (bad JSON, unknown method, bad params) produce error objects.

pub mod protocol;
pub mod transport_line;

use std::path::Path;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, error, info};

use crate::session::{InsertMode, Session, Vote};
use protocol::{
    InsertModeParams, PromptParams, QueryParams, Request, Response, SubmitTypesParams,
    UploadParams, VoteParams, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR,
};
use transport_line::{Incoming, LineTransport};

pub struct LineServer<R, W> {
    transport: LineTransport<R, W>,
    session: Session,
}

impl<R, W> LineServer<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(transport: LineTransport<R, W>, session: Session) -> Self {
        Self { transport, session }
    }

    pub async fn run(&mut self) -> Result<()> {
        info!("Ready to receive line-based requests");

        loop {
            let response = match self.transport.read_message().await {
                Ok(Some(Incoming::Request(request))) => {
                    debug!("Received request: {}", request.method);
                    self.handle_request(request).await
                }
                Ok(Some(Incoming::Malformed(message))) => {
                    Response::error(None, PARSE_ERROR, message)
                }
                Ok(None) => {
                    info!("Input closed");
                    break;
                }
                Err(e) => {
                    error!("Error reading message: {}", e);
                    return Err(e);
                }
            };

            self.transport.write_response(&response).await?;
        }

        Ok(())
    }

    async fn handle_request(&mut self, request: Request) -> Response {
        let id = request.id.clone();
        match self.dispatch(&request.method, request.params).await {
            Ok(text) => Response::text(id, text),
            Err((code, message)) => Response::error(id, code, message),
        }
    }

    async fn dispatch(&mut self, method: &str, params: Value) -> Result<String, (i32, String)> {
        let session = &mut self.session;
        match method {
            "upload" => {
                let p: UploadParams = parse_params(params)?;
                Ok(session.upload_file(Path::new(&p.path)))
            }
            "submit_types" => {
                let p: SubmitTypesParams = parse_params(params)?;
                Ok(session.submit_column_types(&p.types))
            }
            "insert_mode" => {
                let p: InsertModeParams = parse_params(params)?;
                let mode: InsertMode = p.mode.parse().map_err(|e| (INVALID_PARAMS, e))?;
                Ok(session.change_insert_mode(mode))
            }
            "prompt" => {
                let p: PromptParams = parse_params(params)?;
                Ok(session.run_prompt(&p.prompt).await)
            }
            "vote" => {
                let p: VoteParams = parse_params(params)?;
                Ok(session.vote(&Vote {
                    liked: p.liked,
                    value: p.value,
                }))
            }
            "query" => {
                let p: QueryParams = parse_params(params)?;
                Ok(session.query(&p.sql))
            }
            "describe" => Ok(session.describe_table()),
            "status" => Ok(session.table_status()),
            other => Err((METHOD_NOT_FOUND, format!("Method not found: {}", other))),
        }
    }

    pub fn into_parts(self) -> (LineTransport<R, W>, Session) {
        (self.transport, self.session)
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, (i32, String)> {
    serde_json::from_value(params).map_err(|e| (INVALID_PARAMS, format!("Invalid params: {}", e)))
}
