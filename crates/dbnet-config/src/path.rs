use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Dotted location of a field inside a configuration document.
///
/// Rendered as `model.backbone.num_stages` or `train_pipeline[4].args[1].cls`.
/// The empty path renders as `<root>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Path to a top-level key.
    #[must_use]
    pub fn key(name: &str) -> Self {
        Self::root().field(name)
    }

    /// Extend with a mapping key.
    #[must_use]
    pub fn field(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(name.to_string()));
        Self { segments }
    }

    /// Extend with a sequence position.
    #[must_use]
    pub fn index(&self, idx: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(idx));
        Self { segments }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// First key of the path, i.e. the document section it belongs to.
    #[must_use]
    pub fn section(&self) -> Option<&str> {
        match self.segments.first() {
            Some(Segment::Key(k)) => Some(k.as_str()),
            _ => None,
        }
    }

    /// Last key of the path, ignoring trailing indices.
    #[must_use]
    pub fn leaf(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|s| match s {
            Segment::Key(k) => Some(k.as_str()),
            Segment::Index(_) => None,
        })
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                Segment::Key(k) if i == 0 => write!(f, "{k}")?,
                Segment::Key(k) => write!(f, ".{k}")?,
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
