//! Server-Sent Events (SSE) parser for streamed JSON-RPC replies.
//!
//! Streamable HTTP servers may answer a POST with `text/event-stream`; every
//! `message` event then carries one JSON-RPC message in its data lines.

/// A single SSE event parsed from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event_type: Option<String>,
    pub data: String,
}

impl SseEvent {
    /// Events without an explicit type default to `message`.
    pub fn is_message(&self) -> bool {
        matches!(self.event_type.as_deref(), None | Some("message"))
    }
}

/// Incremental SSE parser that processes text chunks into events.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of text and return any complete events.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.buffer.push_str(chunk);
        // Normalise after appending so a CRLF split across chunks still pairs up
        if self.buffer.contains("\r\n") {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..pos + 2).collect();
            if let Some(event) = Self::parse_block(&block) {
                events.push(event);
            }
        }

        events
    }

    fn parse_block(block: &str) -> Option<SseEvent> {
        let mut event_type = None;
        let mut data_lines = Vec::new();

        for line in block.lines() {
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => event_type = Some(value.to_string()),
                "data" => data_lines.push(value),
                _ => {}
            }
        }

        if data_lines.is_empty() {
            return None;
        }

        Some(SseEvent {
            event_type,
            data: data_lines.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_event_with_json_payload() {
        let mut parser = SseParser::new();
        let events =
            parser.feed("event: message\nid: 1\ndata: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n\n");
        assert_eq!(events.len(), 1);
        assert!(events[0].is_message());
        assert_eq!(events[0].data, "{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}");
    }

    #[test]
    fn untyped_event_is_a_message() {
        let mut parser = SseParser::new();
        let events = parser.feed("data: {}\n\n");
        assert!(events[0].is_message());
    }

    #[test]
    fn event_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed("event: message\ndata: {\"a\":").is_empty());
        let events = parser.feed("1}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "{\"a\":1}");
    }

    #[test]
    fn crlf_line_endings() {
        let mut parser = SseParser::new();
        let events = parser.feed("event: message\r\ndata: x\r\n\r\ndata: y\r\n\r\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "x");
        assert_eq!(events[1].data, "y");

        assert!(parser.feed("data: z\r").is_empty());
        let events = parser.feed("\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "z");
    }

    #[test]
    fn multi_line_data_is_joined() {
        let mut parser = SseParser::new();
        let events = parser.feed("data: {\ndata: \"a\": 1\ndata: }\n\n");
        assert_eq!(events[0].data, "{\n\"a\": 1\n}");
    }

    #[test]
    fn comments_and_dataless_blocks_are_skipped() {
        let mut parser = SseParser::new();
        let events = parser.feed(": keep-alive\n\nevent: ping\n\nevent: endpoint\ndata: /mcp\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type.as_deref(), Some("endpoint"));
        assert!(!events[0].is_message());
    }
}
