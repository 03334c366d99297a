//! Helpers for reading UI message stream responses

/// Parsed body of a UI message stream
pub struct UiStream {
    pub events: Vec<serde_json::Value>,
    pub done: bool,
}

impl UiStream {
    /// Parse the `data:` lines of an SSE body
    pub fn parse(text: &str) -> Self {
        let mut events = Vec::new();
        let mut done = false;

        for data in text.lines().filter_map(|line| line.strip_prefix("data: ")) {
            if data == "[DONE]" {
                done = true;
            } else {
                events.push(serde_json::from_str(data).unwrap());
            }
        }

        Self { events, done }
    }

    /// Event types in stream order
    pub fn types(&self) -> Vec<&str> {
        self.events.iter().map(|e| e["type"].as_str().unwrap()).collect()
    }

    /// Concatenated text of all `text-delta` events
    pub fn text(&self) -> String {
        self.of_type("text-delta")
            .filter_map(|e| e["delta"].as_str())
            .collect()
    }

    pub fn of_type<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a serde_json::Value> {
        self.events.iter().filter(move |e| e["type"] == kind)
    }
}
