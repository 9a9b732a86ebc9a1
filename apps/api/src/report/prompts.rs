// Report composer prompt template.
//
// The default below matches the deployed wording; operators can swap the
// whole template at runtime via `REPORT_PROMPT_TEMPLATE` as long as the
// placeholders are kept.

/// Placeholders: `{project}`, `{visit_number}`, `{visit_date}`, `{actions}`,
/// `{previous_report_summary}`, `{media_description}`.
pub const REPORT_PROMPT_TEMPLATE: &str = r#"You are a social welfare expert. Based on the following details from today's field visit, please draft a comprehensive journal report of approximately 500 words that reflects on the social welfare impact and field activities. Follow the structure below:

1. Please describe the plan of action for today's field visit. (Include the date and time, objectives, goals, and the purpose of your visit.)
2. Please describe the activities carried out to complete the action plan. (Outline the work done during the field visit.)
3. What did you observe today that you would like to implement in your next field visit?
4. What are the key learning outcomes from this field visit? (Highlight the lessons learned from the experience.)

Project: {project}
Visit Number: {visit_number}
Date of Visit: {visit_date}
Actions Taken During the Visit: {actions}
Summary of the Previous Visit Report: {previous_report_summary}
Uploaded Media: {media_description}

Include relevant social welfare reflections and ensure the tone is both formal and empathetic."#;
