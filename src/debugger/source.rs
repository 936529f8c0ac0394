use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based.
    pub number: u32,
    pub text: String,
    pub is_current: bool,
    pub has_breakpoint: bool,
}

/// A window of script source around a line of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSnippet {
    pub lines: Vec<SourceLine>,
}

impl SourceSnippet {
    /// `center` and `current` are 0-based; `current` is marked only when set.
    pub fn around(
        source: &str,
        center: u32,
        delta: u32,
        current: Option<u32>,
        breakpoint_lines: &[u32],
    ) -> Self {
        let first = center.saturating_sub(delta);
        let last = center.saturating_add(delta);

        let lines = source
            .split('\n')
            .enumerate()
            .skip(first as usize)
            .take_while(|(index, _)| *index as u32 <= last)
            .map(|(index, text)| {
                let index = index as u32;
                SourceLine {
                    number: index + 1,
                    text: text.trim_end_matches('\r').to_string(),
                    is_current: current == Some(index),
                    has_breakpoint: breakpoint_lines.contains(&index),
                }
            })
            .collect();

        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for SourceSnippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .lines
            .last()
            .map(|line| line.number.to_string().len())
            .unwrap_or(1);

        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let marker = if line.is_current {
                "->"
            } else if line.has_breakpoint {
                " *"
            } else {
                "  "
            };
            write!(f, "{}{:>width$} {}", marker, line.number, line.text, width = width)?;
        }
        Ok(())
    }
}
