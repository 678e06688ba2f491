//! Reading and writing the `authz` files consumed by `mod_authz_svn`.
//!
//! The rendered layout is a compatibility contract with Apache and must not
//! change: a `[groups]` section (only when groups exist), a blank line, then
//! one `[<path>]` section per distinct path, each followed by a blank line.
//!
//! ```text
//! [groups]
//! devs = alice, bob
//!
//! [/]
//! @devs = rw
//!
//! [/docs]
//! carol = r
//!
//! ```

use crate::error::AuthzError;
use crate::groups::GroupRegistry;
use crate::set::AuthorizationSet;
use crate::types::{AccessMode, Principal};
use tracing::{debug, warn};

const GROUPS_HEADER: &str = "[groups]";

/// Renders groups and grants to authz text.
///
/// Groups appear in registry order, skipping groups without members. Grants
/// appear in canonical order, which is also the order `mod_authz_svn` uses
/// to resolve them.
pub fn render(groups: &GroupRegistry, authorizations: &AuthorizationSet) -> String {
    let mut lines = Vec::new();

    if !groups.is_empty() {
        lines.push(GROUPS_HEADER.to_string());
    }
    for group in groups.iter().filter(|g| !g.members.is_empty()) {
        lines.push(format!("{} = {}", group.name, group.members.join(", ")));
    }
    lines.push(String::new());

    for path in authorizations.paths() {
        lines.push(format!("[{}]", path));
        for authorization in authorizations.for_path(path) {
            lines.push(format!(
                "{} = {}",
                authorization.principal(),
                authorization.mode()
            ));
        }
        lines.push(String::new());
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// A line the parser dropped, with the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based position in the input.
    pub line_number: usize,
    /// The line as it appeared in the input.
    pub content: String,
    pub reason: AuthzError,
}

/// Everything recovered from an authz file.
#[derive(Debug, Clone, Default)]
pub struct ParsedAcl {
    pub groups: GroupRegistry,
    pub authorizations: AuthorizationSet,
    pub skipped: Vec<SkippedLine>,
}

impl ParsedAcl {
    fn skip(&mut self, line: &Line<'_>, reason: AuthzError) {
        warn!(
            "Skipping line {} '{}': {}",
            line.number, line.text, reason
        );
        self.skipped.push(SkippedLine {
            line_number: line.number,
            content: line.text.to_string(),
            reason,
        });
    }
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    text: &'a str,
}

/// A section header and the content lines up to the next header.
#[derive(Debug)]
struct Chunk<'a> {
    header: Line<'a>,
    body: Vec<Line<'a>>,
}

impl Chunk<'_> {
    fn is_groups(&self) -> bool {
        self.header.text.trim() == GROUPS_HEADER
    }
}

/// Parses authz text, keeping every grant and group it can.
///
/// A malformed line, an unknown mode, a reference to an undefined group or a
/// duplicate is recorded in [`ParsedAcl::skipped`] and parsing carries on.
/// Groups are read before grants regardless of where the `[groups]` section
/// sits in the file.
pub fn parse(text: &str) -> ParsedAcl {
    let mut parsed = ParsedAcl::default();
    let chunks = split_chunks(text, &mut parsed);

    for chunk in chunks.iter().filter(|c| c.is_groups()) {
        for line in &chunk.body {
            parse_group_line(line, &mut parsed);
        }
    }

    for chunk in chunks.iter().filter(|c| !c.is_groups()) {
        let path = chunk
            .header
            .text
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .trim();
        for line in &chunk.body {
            parse_grant_line(path, line, &mut parsed);
        }
    }

    debug!(
        "Parsed {} groups and {} authorizations, skipped {} lines",
        parsed.groups.len(),
        parsed.authorizations.len(),
        parsed.skipped.len()
    );
    parsed
}

fn split_chunks<'a>(text: &'a str, parsed: &mut ParsedAcl) -> Vec<Chunk<'a>> {
    let mut chunks: Vec<Chunk<'a>> = Vec::new();

    let lines = text
        .lines()
        .enumerate()
        .map(|(index, text)| Line {
            number: index + 1,
            text,
        })
        .filter(|line| !line.text.trim().is_empty());

    for line in lines {
        if line.text.starts_with('[') {
            chunks.push(Chunk {
                header: line,
                body: Vec::new(),
            });
        } else if let Some(chunk) = chunks.last_mut() {
            chunk.body.push(line);
        } else {
            // Content before the first section header belongs to nothing.
            parsed.skip(&line, AuthzError::MalformedLine(line.text.to_string()));
        }
    }

    chunks
}

fn parse_group_line(line: &Line<'_>, parsed: &mut ParsedAcl) {
    let Some((name, members)) = line.text.split_once('=') else {
        parsed.skip(line, AuthzError::MalformedLine(line.text.to_string()));
        return;
    };

    let members = members
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();

    if let Err(e) = parsed.groups.add(name.trim(), members) {
        parsed.skip(line, e);
    }
}

fn parse_grant_line(path: &str, line: &Line<'_>, parsed: &mut ParsedAcl) {
    let Some((principal, mode)) = line.text.split_once('=') else {
        parsed.skip(line, AuthzError::MalformedLine(line.text.to_string()));
        return;
    };

    let grant = Principal::parse(principal.trim()).and_then(|principal| {
        let mode: AccessMode = mode.trim().parse()?;
        parsed
            .authorizations
            .add(path, principal, mode, &parsed.groups)
    });

    if let Err(e) = grant {
        parsed.skip(line, e);
    }
}
