/// Declaration marker that excludes a field from the header entirely.
pub const SKIP: &str = "-";

/// Option requesting an empty cell when the field holds its zero value.
pub const OMIT_EMPTY: &str = "omitempty";

/// Parsed field declaration: `name[,opt1,opt2,...]` or `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    /// Declared name; empty means "use the field's natural name".
    pub name: &'a str,
    pub options: TagOptions<'a>,
    skip: bool,
}

impl Tag<'_> {
    /// The field must be excluded from both header and lookup.
    pub fn is_skip(&self) -> bool {
        self.skip
    }
}

/// Comma-separated options following the name. Unknown options are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagOptions<'a>(&'a str);

impl<'a> TagOptions<'a> {
    pub fn contains(&self, option: &str) -> bool {
        !self.0.is_empty() && self.0.split(',').any(|o| o == option)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.0.split(',').filter(|o| !o.is_empty())
    }
}

pub fn parse_tag(raw: &str) -> Tag<'_> {
    if raw == SKIP {
        return Tag { name: "", options: TagOptions::default(), skip: true };
    }
    match raw.split_once(',') {
        Some((name, options)) => Tag { name, options: TagOptions(options), skip: false },
        None => Tag { name: raw, options: TagOptions::default(), skip: false },
    }
}
