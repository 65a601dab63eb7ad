/// A named bench input and the decoder it is fed to.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    kind: InputKind,
    file: TestFile,
}

impl TestCase {
    pub fn new(name: &'static str, kind: InputKind, file: TestFile) -> Self {
        Self { name, kind, file }
    }

    pub fn request_head(name: &'static str, file: TestFile) -> Self {
        Self::new(name, InputKind::RequestHead, file)
    }

    pub fn uri(name: &'static str, file: TestFile) -> Self {
        Self::new(name, InputKind::Uri, file)
    }

    pub fn query(name: &'static str, file: TestFile) -> Self {
        Self::new(name, InputKind::Query, file)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }

    /// Input length in bytes, used as the throughput of the bench.
    pub fn len(&self) -> u64 {
        self.file.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.file.content.is_empty()
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    /// The query part of a uri file: everything between `?` and `#`.
    pub fn query(&self) -> &'static str {
        let query = self.content.split_once('?').map_or("", |(_, query)| query);
        query.split_once('#').map_or(query, |(query, _)| query)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    RequestHead,
    Uri,
    Query,
}
