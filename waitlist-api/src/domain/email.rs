use std::fmt;
use std::ops::Deref;

use mailparse::addrparse;
use thiserror::Error;

const MAX_EMAIL_LEN: usize = 254;
const MAX_LOCAL_PART_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 255;

/// A validated, lowercased email address.
///
/// Only [`CanonicalEmail::parse`] can produce one, so holding a value means
/// every signup check has already passed. Two inputs that denote the same
/// address parse to equal values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalEmail(String);

/// Why a raw string could not become a [`CanonicalEmail`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email is too long (max 254 characters)")]
    TooLong,
    #[error("invalid email format")]
    InvalidFormat,
    #[error("email local part is invalid")]
    InvalidLocalPart,
    #[error("email domain is invalid")]
    InvalidDomain,
    #[error("email domain must contain at least one dot")]
    InvalidDomainNoDot,
}

impl EmailError {
    /// Stable snake_case tag, e.g. `invalid_domain_no_dot`.
    pub fn reason(&self) -> &'static str {
        self.into()
    }
}

impl CanonicalEmail {
    /// Validates and normalizes untrusted input.
    ///
    /// Checks run in a fixed order and the first violated rule is reported:
    /// emptiness, total length, mailbox syntax, local part, domain, domain dot.
    /// Lengths are measured in bytes after trimming and before lowercasing.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }

        if trimmed.len() > MAX_EMAIL_LEN {
            return Err(EmailError::TooLong);
        }

        let address = extract_mailbox(trimmed)?;

        let mut parts = address.split('@');
        let (Some(local_part), Some(domain), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(EmailError::InvalidFormat);
        };

        if local_part.is_empty() || local_part.len() > MAX_LOCAL_PART_LEN {
            return Err(EmailError::InvalidLocalPart);
        }

        if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
            return Err(EmailError::InvalidDomain);
        }

        if !domain.contains('.') {
            return Err(EmailError::InvalidDomainNoDot);
        }

        Ok(Self(address.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parses `input` as exactly one RFC 5322 mailbox and returns its bare address.
///
/// `Name <addr>` yields `addr` when the angle-addr closes the input; anything
/// else is read as a bare addr-spec.
fn extract_mailbox(input: &str) -> Result<String, EmailError> {
    if !(input.contains('<') && input.ends_with('>')) {
        return parse_addr_spec(input);
    }

    let info = addrparse(input)
        .ok()
        .and_then(|list| list.extract_single_info())
        .ok_or(EmailError::InvalidFormat)?;

    parse_addr_spec(&info.addr)
}

/// `local-part "@" domain` where the local part is a dot-atom or a quoted
/// string and the domain is a dot-atom. Domain literals and comments are
/// not accepted.
///
/// Quotes are dropped when the quoted content is itself a dot-atom, so
/// `"john"@example.com` and `john@example.com` come out equal.
fn parse_addr_spec(input: &str) -> Result<String, EmailError> {
    let (local_part, rest) = match input.strip_prefix('"') {
        Some(quoted) => {
            let (content, rest) = consume_quoted_string(quoted)?;
            if is_dot_atom(&content) {
                (content, rest)
            } else {
                (quote(&content), rest)
            }
        }
        None => {
            let at = input.find('@').ok_or(EmailError::InvalidFormat)?;
            let local_part = &input[..at];
            if !is_dot_atom(local_part) {
                return Err(EmailError::InvalidFormat);
            }
            (local_part.to_string(), &input[at..])
        }
    };

    let domain = rest.strip_prefix('@').ok_or(EmailError::InvalidFormat)?;
    if !is_dot_atom(domain) {
        return Err(EmailError::InvalidFormat);
    }

    Ok(format!("{local_part}@{domain}"))
}

/// Reads a quoted string up to its closing quote, resolving quoted pairs.
/// Returns the unescaped content and the input after the closing quote.
fn consume_quoted_string(input: &str) -> Result<(String, &str), EmailError> {
    let mut content = String::new();
    let mut chars = input.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' if content.is_empty() => return Err(EmailError::InvalidFormat),
            '"' => return Ok((content, &input[i + 1..])),
            '\\' => match chars.next() {
                Some((_, escaped)) if is_vchar(escaped) || escaped == ' ' || escaped == '\t' => {
                    content.push(escaped)
                }
                _ => return Err(EmailError::InvalidFormat),
            },
            c if is_qcontent(c) => content.push(c),
            _ => return Err(EmailError::InvalidFormat),
        }
    }

    Err(EmailError::InvalidFormat)
}

fn quote(content: &str) -> String {
    let mut quoted = String::with_capacity(content.len() + 2);
    quoted.push('"');
    for c in content.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn is_dot_atom(s: &str) -> bool {
    !s.is_empty()
        && s
            .split('.')
            .all(|atom| !atom.is_empty() && atom.chars().all(is_atext))
}

/// Visible ASCII, or any non-control, non-space character (RFC 6532).
fn is_vchar(c: char) -> bool {
    c.is_ascii_graphic() || (!c.is_ascii() && !c.is_control() && !c.is_whitespace())
}

fn is_atext(c: char) -> bool {
    is_vchar(c) && !"()<>[]:;@\\,.\"".contains(c)
}

/// Characters allowed unescaped inside a quoted string.
fn is_qcontent(c: char) -> bool {
    (is_vchar(c) && c != '"' && c != '\\') || c == ' ' || c == '\t'
}

impl TryFrom<&str> for CanonicalEmail {
    type Error = EmailError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl Deref for CanonicalEmail {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for CanonicalEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
