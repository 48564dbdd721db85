//! Word splitting for command lines handed over as a single string
//! (`$COMMANDLINE`, `$COMP_WORDS`).
use pest::iterators::Pair;
use pest::Parser;

use crate::error::{CompletionError, Result};

#[derive(Parser)]
#[grammar = "cmdline.pest"]
struct CommandLineParser;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SplitLine {
    pub words: Vec<String>,
    /// The line ends with an unquoted blank: the user is at a fresh word.
    pub trailing_space: bool,
    /// The last word has an unterminated quote.
    pub open_quote: bool,
}

impl SplitLine {
    /// The words to complete: the last one is the fragment under the
    /// cursor, which is empty if the line ends with a blank.
    pub fn into_completion_line(self) -> Vec<String> {
        let mut words = self.words;
        if self.trailing_space {
            words.push(String::new());
        }

        words
    }
}

fn visit_word(pair: Pair<Rule>, open_quote: &mut bool) -> String {
    let mut word = String::new();
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::bare => word.push_str(part.as_str()),
            Rule::escaped => {
                // `\<newline>` is a line continuation.
                let escaped = &part.as_str()[1..];
                if escaped != "\n" {
                    word.push_str(escaped);
                }
            }
            Rule::single_quoted => {
                for inner in part.into_inner() {
                    match inner.as_rule() {
                        Rule::single_text => word.push_str(inner.as_str()),
                        Rule::unterminated => *open_quote = true,
                        _ => (),
                    }
                }
            }
            Rule::double_quoted => {
                for inner in part.into_inner() {
                    match inner.as_rule() {
                        Rule::double_text => word.push_str(inner.as_str()),
                        Rule::double_escaped => match inner.as_str()[1..].chars().next() {
                            Some('\n') | None => (),
                            Some(ch) if "$`\"\\".contains(ch) => word.push(ch),
                            // Not an escape sequence inside double quotes.
                            Some(_) => word.push_str(inner.as_str()),
                        },
                        Rule::unterminated => *open_quote = true,
                        _ => (),
                    }
                }
            }
            _ => (),
        }
    }

    word
}

pub fn split(line: &str) -> Result<SplitLine> {
    let mut pairs = CommandLineParser::parse(Rule::line, line)
        .map_err(|err| CompletionError::MalformedInvocation(format!("cannot split the command line: {}", err)))?;

    let mut words = Vec::new();
    let mut open_quote = false;
    let mut last_end = 0;
    if let Some(root) = pairs.next() {
        for pair in root.into_inner() {
            if pair.as_rule() == Rule::word {
                last_end = pair.as_span().end();
                words.push(visit_word(pair, &mut open_quote));
            }
        }
    }

    Ok(SplitLine {
        trailing_space: !open_quote && last_end < line.len(),
        words,
        open_quote,
    })
}
