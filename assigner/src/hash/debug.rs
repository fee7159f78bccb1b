// hash/debug.rs — Human-readable "digest" for development builds
//
// Not collision resistant: the output is the input with each run of
// non-alphanumeric characters replaced by the hex of its UTF-8 bytes.

use super::HashInput;

#[derive(Debug, Default, Clone)]
pub struct DebugHash {
    text: String,
}

impl DebugHash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: HashInput<'_>) -> &mut Self {
        match data {
            HashInput::Text(text) => self.text.push_str(text),
            HashInput::Bytes(bytes) => self.text.push_str(&String::from_utf8_lossy(bytes)),
        }
        self
    }

    pub fn digest(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut run = String::new();
        for c in self.text.chars() {
            if c.is_ascii_alphanumeric() {
                if !run.is_empty() {
                    out.push_str(&hex::encode(run.as_bytes()));
                    run.clear();
                }
                out.push(c);
            } else {
                run.push(c);
            }
        }
        if !run.is_empty() {
            out.push_str(&hex::encode(run.as_bytes()));
        }
        out
    }
}
