use std::{borrow::Borrow, collections::HashMap, ffi::OsStr, fmt, hash::Hash};

use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InterpError {
    #[error("Undefined variable '{0}' at {}", .1+1)]
    UndefinedVar(String, usize),

    #[error("Unclosed brace (found '#{{' at {})", .0+1)]
    UnclosedBrace(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var { name: String, pos: usize },
}

/// A string with `#{name}` placeholders, parsed once and rendered many times.
/// `##` stands for a literal `#`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(fmt: &str) -> Result<Self, InterpError> {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum State {
            Normal,
            HashMark,
            InsideBrace,
        }
        use State::*;

        let mut state = Normal;
        let mut pos_hash = 0;
        let mut segments = Vec::new();
        let mut literal = String::with_capacity(fmt.len());
        let mut var_name = String::with_capacity(32);

        for (i, c) in fmt.chars().enumerate() {
            match (c, state) {
                ('#', Normal) => {
                    state = HashMark;
                    pos_hash = i;
                    literal.push(c);
                }
                ('#', HashMark) => {
                    state = Normal;
                }
                ('{', HashMark) => {
                    state = InsideBrace;
                    literal.pop(); // remove '#'
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    var_name.clear();
                }
                ('}', InsideBrace) => {
                    state = Normal;
                    segments.push(Segment::Var {
                        name: std::mem::take(&mut var_name),
                        pos: pos_hash,
                    });
                }
                (_, InsideBrace) => {
                    var_name.push(c);
                }
                _ => {
                    state = Normal;
                    literal.push(c);
                }
            }
        }

        if state == InsideBrace {
            return Err(InterpError::UnclosedBrace(pos_hash));
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self {
            source: fmt.to_owned(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn var_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Var { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn render<K, V>(&self, variables: &HashMap<K, V>) -> Result<String, InterpError>
    where
        K: Borrow<str> + Hash + Eq,
        V: AsRef<OsStr>,
    {
        let mut res = String::with_capacity(self.source.len() * 2);
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => res += s,
                Segment::Var { name, pos } => {
                    let Some(value) = variables.get(name.as_str()) else {
                        return Err(InterpError::UndefinedVar(name.clone(), *pos));
                    };
                    res += value.as_ref().to_string_lossy().as_ref();
                }
            }
        }
        Ok(res)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for Template {
    type Error = InterpError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Template> for String {
    fn from(t: Template) -> Self {
        t.source
    }
}
