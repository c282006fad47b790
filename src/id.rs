/// Source of unique ids for blocks and tabs. Each document owns its own
/// generator, so ids never collide across open documents.
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> String;
}

pub struct UuidIdGen;

impl Default for UuidIdGen {
    fn default() -> Self {
        Self
    }
}

impl IdGenerator for UuidIdGen {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic `prefix-N` ids for tests and reproducible output.
pub struct SequentialIdGen {
    prefix: String,
    next: u64,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("block")
    }
}

impl IdGenerator for SequentialIdGen {
    fn next_id(&mut self) -> String {
        let id = self.next;
        self.next += 1;
        format!("{}-{}", self.prefix, id)
    }
}
