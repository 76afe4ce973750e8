//! Spreadsheet import for quiz and practice lessons.
//!
//! Authors export a sheet as CSV with a header row. Quiz sheets use the
//! columns `question, option_a, option_b, option_c, option_d, correct`
//! where `correct` is a letter (`A`-`D`) or a 1-based option number.
//! Practice sheets use `prompt, answer`. Column order is free; header names
//! are matched case-insensitively.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Option columns of a quiz sheet, in display order.
pub const QUIZ_OPTION_COLUMNS: &[&str] = &["option_a", "option_b", "option_c", "option_d"];

/// Minimum number of non-empty options per question.
pub const MIN_QUIZ_OPTIONS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeItem {
    pub prompt: String,
    pub answer: String,
}

// ---------------------------------------------------------------------------
// Quiz
// ---------------------------------------------------------------------------

/// Parse a quiz sheet. Row numbers in errors are 1-based and count the
/// header row, matching what a spreadsheet shows.
pub fn parse_quiz_csv(data: &str) -> Result<Vec<QuizQuestion>, CoreError> {
    let sheet = Sheet::parse(data)?;
    let question_col = sheet.require_column("question")?;
    let correct_col = sheet.require_column("correct")?;
    let option_cols = QUIZ_OPTION_COLUMNS
        .iter()
        .map(|name| sheet.require_column(name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut questions = Vec::with_capacity(sheet.rows.len());
    for (row_number, values) in &sheet.rows {
        let question = cell(values, question_col);
        if question.is_empty() {
            return Err(row_error(*row_number, "question is empty"));
        }

        // Blank options are dropped; `correct` refers to the column letter,
        // so keep a column -> option mapping.
        let mut options = Vec::new();
        let mut column_to_option = Vec::with_capacity(option_cols.len());
        for &col in &option_cols {
            let option = cell(values, col);
            if option.is_empty() {
                column_to_option.push(None);
            } else {
                column_to_option.push(Some(options.len()));
                options.push(option.to_string());
            }
        }
        if options.len() < MIN_QUIZ_OPTIONS {
            return Err(row_error(
                *row_number,
                &format!("needs at least {MIN_QUIZ_OPTIONS} options, found {}", options.len()),
            ));
        }

        let raw_correct = cell(values, correct_col);
        let column = parse_correct(raw_correct, option_cols.len())
            .ok_or_else(|| row_error(*row_number, &format!("correct answer '{raw_correct}' is not A-D or 1-4")))?;
        let correct_index = column_to_option[column].ok_or_else(|| {
            row_error(
                *row_number,
                &format!("correct answer '{raw_correct}' points at an empty option"),
            )
        })?;

        questions.push(QuizQuestion {
            question: question.to_string(),
            options,
            correct_index,
        });
    }

    if questions.is_empty() {
        return Err(CoreError::Import("Sheet has no questions".into()));
    }
    Ok(questions)
}

fn parse_correct(raw: &str, option_count: usize) -> Option<usize> {
    let raw = raw.trim();
    let index = if let Ok(n) = raw.parse::<usize>() {
        n.checked_sub(1)?
    } else {
        let mut chars = raw.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        if chars.next().is_some() || !letter.is_ascii_uppercase() {
            return None;
        }
        (letter as u8 - b'A') as usize
    };
    (index < option_count).then_some(index)
}

// ---------------------------------------------------------------------------
// Practice
// ---------------------------------------------------------------------------

pub fn parse_practice_csv(data: &str) -> Result<Vec<PracticeItem>, CoreError> {
    let sheet = Sheet::parse(data)?;
    let prompt_col = sheet.require_column("prompt")?;
    let answer_col = sheet.require_column("answer")?;

    let mut items = Vec::with_capacity(sheet.rows.len());
    for (row_number, values) in &sheet.rows {
        let prompt = cell(values, prompt_col);
        let answer = cell(values, answer_col);
        if prompt.is_empty() {
            return Err(row_error(*row_number, "prompt is empty"));
        }
        if answer.is_empty() {
            return Err(row_error(*row_number, "answer is empty"));
        }
        items.push(PracticeItem {
            prompt: prompt.to_string(),
            answer: answer.to_string(),
        });
    }

    if items.is_empty() {
        return Err(CoreError::Import("Sheet has no practice items".into()));
    }
    Ok(items)
}

// ---------------------------------------------------------------------------
// CSV plumbing
// ---------------------------------------------------------------------------

struct Sheet {
    headers: Vec<String>,
    /// (1-based row number, cells); blank lines are skipped.
    rows: Vec<(usize, Vec<String>)>,
}

impl Sheet {
    fn parse(data: &str) -> Result<Self, CoreError> {
        let data = data.strip_prefix('\u{feff}').unwrap_or(data);
        let mut records = parse_records(data).into_iter();

        let (_, header) = records
            .next()
            .ok_or_else(|| CoreError::Import("Sheet is empty".into()))?;
        let headers: Vec<String> = header
            .into_iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .collect();

        Ok(Self {
            headers,
            rows: records.collect(),
        })
    }

    fn require_column(&self, name: &str) -> Result<usize, CoreError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CoreError::Import(format!("Missing column '{name}'")))
    }
}

fn cell(values: &[String], col: usize) -> &str {
    values.get(col).map(|s| s.trim()).unwrap_or("")
}

fn row_error(row_number: usize, message: &str) -> CoreError {
    CoreError::Import(format!("Row {row_number}: {message}"))
}

/// Split CSV text into records, honouring quoted fields and `""` escapes.
/// A quoted field may span line breaks. Each record carries the 1-based
/// line it starts on; blank lines are dropped.
fn parse_records(data: &str) -> Vec<(usize, Vec<String>)> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_start = 1;
    let mut chars = data.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\r' && chars.peek() == Some(&'\n') {
            continue;
        }
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                line += usize::from(ch == '\n');
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == ',' {
            fields.push(std::mem::take(&mut current));
        } else if ch == '\n' {
            fields.push(std::mem::take(&mut current));
            push_record(&mut records, record_start, std::mem::take(&mut fields));
            line += 1;
            record_start = line;
        } else {
            current.push(ch);
        }
    }
    fields.push(current);
    push_record(&mut records, record_start, fields);
    records
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, line: usize, fields: Vec<String>) {
    if fields.iter().all(|f| f.trim().is_empty()) {
        return;
    }
    records.push((line, fields));
}
