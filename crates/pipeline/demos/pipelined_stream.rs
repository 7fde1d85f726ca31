//! Feeds a recorded client stream to a [`MessageParser`] in uneven chunks, the
//! way reads from a socket would arrive, and prints every request it completes.
//!
//! Run with `cargo run --example pipelined_stream`.

use micro_http_pipeline::assembler::MessageParser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const STREAM: &[u8] = b"GET /index.html HTTP/1.1\r\nHost: localhost\r\nAccept: text/html\r\n\r\n\
POST /api/echo?pretty=true HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: 17\r\n\r\n{\"hello\":\"world\"}\
PUT /upload HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nfirst\r\n7\r\n-second\r\n0\r\n\r\n\
GET /bye HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";

const READ_SIZES: [usize; 5] = [13, 61, 7, 120, 32];

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut parser = MessageParser::new();
    let mut offset = 0;

    for read_size in READ_SIZES.iter().cycle() {
        if offset >= STREAM.len() {
            break;
        }
        let end = (offset + read_size).min(STREAM.len());
        let chunk = &STREAM[offset..end];
        offset = end;

        let messages = match parser.execute_slice(chunk) {
            Ok(messages) => messages,
            Err(e) => {
                error!(cause = %e, "stream rejected, closing");
                return;
            }
        };

        for message in messages {
            info!(
                method = %message.method().map_or("-", |m| m.as_str()),
                path = message.path().unwrap_or("-"),
                query = message.query_string().unwrap_or("-"),
                headers = message.headers().len(),
                body = %String::from_utf8_lossy(message.body()),
                keep_alive = message.keep_alive(),
                "request received"
            );
        }
    }

    if !parser.is_idle() {
        warn!("stream ended in the middle of a request");
    }
}
