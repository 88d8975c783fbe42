//! Fixed prompt templates.
//!
//! Every function here is a pure function of its arguments.

pub use coursecraft_shared::ContentKind as OutputShape;

/// Build the user prompt for `query`, constrained to `domain` and shaped
/// for `shape`.
pub fn build_prompt(domain: &str, query: &str, shape: OutputShape) -> String {
    match shape {
        OutputShape::FreeText => free_text_prompt(domain, query),
        OutputShape::CsvTable => csv_prompt(domain, query),
        OutputShape::SlideOutline => slide_prompt(domain, query),
    }
}

/// System role sent with the prompt. CSV requests carry none.
pub fn system_role(domain: &str, shape: OutputShape) -> Option<String> {
    match shape {
        OutputShape::FreeText => Some(format!(
            "You are an expert in the {domain} domain only. Only answer questions within \
             that domain and don't answer any other questions. Don't analyze or summarize \
             documents that are not related to the {domain} domain."
        )),
        OutputShape::CsvTable => None,
        OutputShape::SlideOutline => Some(format!("You are a {domain} domain expert.")),
    }
}

/// Prompt for answering a question about an uploaded document's text.
pub fn build_document_question(context: &str, question: &str) -> String {
    format!("Context: {context}\nQuestion: {question}")
}

fn free_text_prompt(domain: &str, query: &str) -> String {
    format!(
        "You are an expert in the {domain} domain only. Answer the following query only if \
         it belongs to the {domain} domain. If it does not, refuse and say that you can only \
         answer {domain} questions.\n\
         \n\
         Query: {query}"
    )
}

fn csv_prompt(domain: &str, query: &str) -> String {
    format!(
        "You are an expert in the {domain} domain only. Only answer those questions and \
         don't answer any other questions.\n\
         Please provide reliable and accurate {domain} data related to the following query.\n\
         The data should include at least 15 to 20 entries and be formatted as a CSV for the \
         {domain} domain only. Don't provide CSV data of any other domain.\n\
         The data must be accurate and trustworthy.\n\
         \n\
         Query: {query}\n\
         \n\
         The result must be a CSV table with one header row followed by 15 to 20 data rows. \
         Do not write any text before or after the table."
    )
}

fn slide_prompt(domain: &str, query: &str) -> String {
    format!(
        "You are an expert in the {domain} domain. Only generate presentations for queries \
         in that domain and don't answer any other queries.\n\
         Generate a professional, formal PowerPoint presentation on the topic: '{query}'.\n\
         1. Include detailed content for each slide, with a proper introduction, key points, \
         examples, and conclusion.\n\
         2. Every slide must contain at least 4 detailed points, not paragraphs.\n\
         3. Ensure all key points are elaborated and written in a formal and organized format.\n\
         4. Use appropriate headings, subpoints, and examples relevant to the {domain} domain.\n\
         5. The structure should include:\n\
         - Title Slide (topic, subtitle, author name placeholder)\n\
         - Introduction Slide (definition and importance of the topic)\n\
         - 4-6 Key Point Slides (elaborated details for each key point)\n\
         - Case Studies/Examples Slide (real-world examples or applications)\n\
         - Conclusion Slide (future implications or summary)\n\
         Format: write each slide as one block, separate blocks with a blank line, and start \
         each block with the slide title followed by a colon (`Title: `) and then the slide \
         body.\n\
         Do not use vague terms. Be specific and thorough."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shape_embeds_domain_and_query() {
        for shape in [
            OutputShape::FreeText,
            OutputShape::CsvTable,
            OutputShape::SlideOutline,
        ] {
            let prompt = build_prompt("Cardiology", "recent stent trials", shape);
            assert!(prompt.contains("Cardiology"), "{shape}: missing domain");
            assert!(prompt.contains("recent stent trials"), "{shape}: missing query");
        }
    }

    #[test]
    fn prompts_are_deterministic() {
        let a = build_prompt("Oncology", "CAR-T", OutputShape::SlideOutline);
        let b = build_prompt("Oncology", "CAR-T", OutputShape::SlideOutline);
        assert_eq!(a, b);
    }

    #[test]
    fn free_text_requires_refusal() {
        let prompt = build_prompt("Dermatology", "acne treatments", OutputShape::FreeText);
        assert!(prompt.contains("refuse"));
    }

    #[test]
    fn csv_prompt_constrains_shape() {
        let prompt = build_prompt("Pharmacology", "statin dosages", OutputShape::CsvTable);
        assert!(prompt.contains("15 to 20"));
        assert!(prompt.contains("header row"));
        assert!(prompt.contains("any other domain"));
        assert!(prompt.contains("before or after the table"));
    }

    #[test]
    fn slide_prompt_describes_skeleton() {
        let prompt = build_prompt("Neurology", "stroke care", OutputShape::SlideOutline);
        assert!(prompt.contains("Introduction Slide"));
        assert!(prompt.contains("4-6 Key Point Slides"));
        assert!(prompt.contains("at least 4"));
        assert!(prompt.contains("Case Studies"));
        assert!(prompt.contains("Conclusion Slide"));
        assert!(prompt.contains("`Title: `"));
    }

    #[test]
    fn system_roles_per_shape() {
        assert!(system_role("Cardiology", OutputShape::FreeText).unwrap().contains("Cardiology"));
        assert!(system_role("Cardiology", OutputShape::CsvTable).is_none());
        assert_eq!(
            system_role("Cardiology", OutputShape::SlideOutline).as_deref(),
            Some("You are a Cardiology domain expert.")
        );
    }

    #[test]
    fn document_question_layout() {
        assert_eq!(
            build_document_question("Page one.", "What is it about?"),
            "Context: Page one.\nQuestion: What is it about?"
        );
    }
}
