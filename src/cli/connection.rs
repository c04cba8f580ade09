use std::io;

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};

use crate::{
    server::{RecommendRequest, Request, Response, SearchRequest},
    types::Track,
};

/// Client side of the line protocol: one request out, one response back.
pub struct ServerConnection {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

/// Result of a request the server answered with a success envelope.
#[derive(Debug, Clone)]
pub struct Reply {
    pub tracks: Vec<Track>,
    pub strategy: Option<String>,
}

impl ServerConnection {
    pub async fn connect(address: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
        })
    }

    pub async fn search_tracks(&mut self, query: &str, limit: usize) -> Result<Reply, String> {
        self.send(&Request::Search(SearchRequest {
            query: query.to_string(),
            limit: Some(limit),
        }))
        .await
    }

    pub async fn recommendations(&mut self, seed: &Track, count: usize) -> Result<Reply, String> {
        self.send(&Request::Recommend(RecommendRequest::for_track(
            seed,
            Some(count),
        )))
        .await
    }

    /// Sends a request and waits for its response line. Error envelopes come
    /// back as `Err` carrying the server's message.
    pub async fn send(&mut self, request: &Request) -> Result<Reply, String> {
        let mut line = request.to_line().map_err(|e| e.to_string())?;
        line.push('\n');
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| e.to_string())?;

        let Some(response) = self.lines.next_line().await.map_err(|e| e.to_string())? else {
            return Err("Server closed the connection".to_string());
        };

        match serde_json::from_str::<Response>(&response).map_err(|e| e.to_string())? {
            Response::Success { data, strategy, .. } => Ok(Reply {
                tracks: data,
                strategy,
            }),
            Response::Error { message } => Err(message),
        }
    }

    pub async fn disconnect(mut self) {
        self.writer.shutdown().await.ok();
    }
}
