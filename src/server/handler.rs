use std::{io, sync::Arc, time::Duration};

use tokio::{
    io::{
        AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt,
        BufReader,
    },
    time::timeout,
};
use tokio_util::sync::CancellationToken;

use crate::{
    info,
    recommend::RecommendationEngine,
    server::protocol::{
        Action, ProtocolError, RecommendRequest, Request, Response, SearchRequest,
    },
    warning,
};

/// Longest request line accepted, excluding the newline.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Fallbacks for optional request fields.
#[derive(Debug, Clone, Copy)]
pub struct RequestDefaults {
    pub search_limit: usize,
    pub count: usize,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            search_limit: 20,
            count: 10,
        }
    }
}

/// Serves one client connection: read a line, dispatch it, write exactly one
/// response line, repeat.
///
/// Anything wrong with a request (bad JSON, unknown action, missing fields, a
/// failing catalog call) becomes an error envelope and the connection stays
/// open. Only I/O failure, EOF, the idle timeout or shutdown end the loop.
pub struct ConnectionHandler {
    id: u64,
    engine: Arc<RecommendationEngine>,
    defaults: RequestDefaults,
}

impl ConnectionHandler {
    pub fn new(id: u64, engine: Arc<RecommendationEngine>, defaults: RequestDefaults) -> Self {
        Self {
            id,
            engine,
            defaults,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn run<S>(
        &self,
        stream: S,
        idle_timeout: Duration,
        shutdown: CancellationToken,
    ) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let mut limited = (&mut reader).take(MAX_LINE_BYTES as u64 + 1);
            let read = tokio::select! {
                _ = shutdown.cancelled() => break,
                read = timeout(
                    idle_timeout,
                    limited.read_until(b'\n', &mut buf),
                ) => read,
            };

            match read {
                Err(_) => {
                    info!("[client {}] idle for {}s, closing", self.id, idle_timeout.as_secs());
                    break;
                }
                Ok(Ok(0)) => break,
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(e),
            }

            if buf.len() > MAX_LINE_BYTES && buf.last() != Some(&b'\n') {
                warning!("[client {}] request line over {} bytes", self.id, MAX_LINE_BYTES);
                let response = Response::error(ProtocolError::LineTooLong.to_string());
                write_response(&mut writer, &response).await?;

                match timeout(idle_timeout, skip_line(&mut reader)).await {
                    Ok(Ok(true)) => continue,
                    Ok(Ok(false)) | Err(_) => break,
                    Ok(Err(e)) => return Err(e),
                }
            }

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = self.handle_line(line).await;
            write_response(&mut writer, &response).await?;
        }

        writer.shutdown().await.ok();
        Ok(())
    }

    /// Turns one request line into its response envelope. Never fails.
    pub async fn handle_line(&self, line: &str) -> Response {
        match Request::parse(line) {
            Ok(request) => {
                info!("[client {}] {:?}", self.id, request.action());
                match request {
                    Request::Search(req) => self.search(req).await,
                    Request::Recommend(req) => self.recommend(req).await,
                }
            }
            Err(e) => {
                warning!("[client {}] rejected request: {}", self.id, e);
                Response::error(e.to_string())
            }
        }
    }

    async fn search(&self, req: SearchRequest) -> Response {
        let limit = req.limit.unwrap_or(self.defaults.search_limit);

        match self.engine.catalog().search_tracks(&req.query, limit).await {
            Ok(mut tracks) => {
                tracks.truncate(limit);
                Response::success(Action::Search, tracks)
            }
            Err(e) => {
                warning!("[client {}] search failed: {}", self.id, e);
                Response::error(format!("Search failed: {}", e.client_message()))
            }
        }
    }

    async fn recommend(&self, req: RecommendRequest) -> Response {
        let count = req.count.unwrap_or(self.defaults.count);
        let seed = req.seed_track();

        match self.engine.get_recommendations(&seed, count).await {
            Ok(recs) => {
                info!(
                    "[client {}] {} recommendations for {:?} using {}",
                    self.id,
                    recs.tracks.len(),
                    seed.name,
                    recs.strategy
                );
                Response::recommended(recs.tracks, recs.strategy)
            }
            Err(e) => {
                warning!("[client {}] recommendation failed: {}", self.id, e);
                Response::error(format!("Recommendation failed: {}", e.client_message()))
            }
        }
    }
}

async fn write_response<W>(writer: &mut W, response: &Response) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(response.to_line().as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

/// Discards input up to and including the next newline without buffering it.
/// Returns `false` if the stream ended first.
async fn skip_line<R>(reader: &mut R) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            return Ok(false);
        }
        match chunk.iter().position(|b| *b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(true);
            }
            None => {
                let len = chunk.len();
                reader.consume(len);
            }
        }
    }
}
