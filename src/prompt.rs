//! Prompt templates for the fine-tuned task models.
//!
//! The templates must match the ones used when the adapters were trained:
//!
//! ```text
//! Given the SQL code.
//! <table>
//! Generate the SQL code to answer the following question.
//! <question>
//! Answer:
//! ```
//!
//! ```text
//! Summarize the following text.
//! <text>
//! Summary:
//! ```

use crate::types::TaskRequest;

const SQL_INSTRUCTION: &str = "Given the SQL code.\n";
const SQL_QUESTION_INSTRUCTION: &str = "Generate the SQL code to answer the following question.\n";
const SQL_ANSWER_MARKER: &str = "Answer:";

const SUMMARY_INSTRUCTION: &str = "Summarize the following text.\n";
const SUMMARY_MARKER: &str = "Summary:";

/// Build the model prompt for a task request.
pub fn build_prompt(task: &TaskRequest) -> String {
    match task {
        TaskRequest::Sql {
            sql_table,
            question,
        } => sql_prompt(sql_table, question),
        TaskRequest::Summary { text } => summary_prompt(text),
    }
}

fn sql_prompt(sql_table: &str, question: &str) -> String {
    format!(
        "{SQL_INSTRUCTION}{}\n{SQL_QUESTION_INSTRUCTION}{}\n{SQL_ANSWER_MARKER}",
        sql_table.trim(),
        question.trim()
    )
}

fn summary_prompt(text: &str) -> String {
    let text = text.trim().trim_matches('\n');
    format!("{SUMMARY_INSTRUCTION}{text}\n{SUMMARY_MARKER}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TABLE: &str = "CREATE TABLE department (creation VARCHAR, department_id VARCHAR);
CREATE TABLE management (department_id VARCHAR, head_id VARCHAR);
CREATE TABLE head (head_id VARCHAR, born_state VARCHAR)";

    #[test]
    fn test_sql_prompt_exact() {
        let prompt = build_prompt(&TaskRequest::Sql {
            sql_table: "  CREATE TABLE head (age INT)\n".to_string(),
            question: "\nHow many heads are older than 56?  ".to_string(),
        });
        assert_eq!(
            prompt,
            "Given the SQL code.\nCREATE TABLE head (age INT)\nGenerate the SQL code to answer the following question.\nHow many heads are older than 56?\nAnswer:"
        );
    }

    #[test]
    fn test_sql_prompt_order_and_suffix() {
        let question = "\nWhat are the distinct creation years of the departments\nmanaged by a secretary born in state 'Alabama'?\nAnswer:\n";
        let prompt = build_prompt(&TaskRequest::Sql {
            sql_table: TABLE.to_string(),
            question: question.to_string(),
        });

        assert!(prompt.ends_with("Answer:"));
        let table_at = prompt.find(TABLE).unwrap();
        let question_at = prompt.find(question.trim()).unwrap();
        assert!(table_at < question_at);
    }

    #[test]
    fn test_summary_prompt() {
        let prompt = build_prompt(&TaskRequest::Summary {
            text: "\n\n  Do not use this command in production.\n\n".to_string(),
        });
        assert_eq!(
            prompt,
            "Summarize the following text.\nDo not use this command in production.\nSummary:"
        );
    }

    #[test]
    fn test_empty_input_still_builds() {
        let prompt = build_prompt(&TaskRequest::Summary {
            text: String::new(),
        });
        assert_eq!(prompt, "Summarize the following text.\n\nSummary:");
    }
}
