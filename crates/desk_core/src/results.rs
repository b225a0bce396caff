use crate::intake::file_stem;
use crate::{JobInput, JobOptions, ResultFile, ResultId, ToolKey};

/// Computes one result per input from the inputs and the frozen options.
///
/// Deterministic: the same request always yields the same results.
pub fn plan_results(
    tool: ToolKey,
    job_id: u64,
    inputs: &[JobInput],
    options: &JobOptions,
) -> Vec<ResultFile> {
    let spec = tool.spec();
    let factor = spec.size_factor(|key| options.choice(key).map(str::to_string));
    let format = if options.output_format().is_empty() {
        spec.default_format
    } else {
        options.output_format()
    };
    inputs
        .iter()
        .zip(0u32..)
        .map(|(input, index)| ResultFile {
            id: ResultId { job_id, index },
            source_file_id: input.file_id,
            derived_name: derived_name(&input.name, format),
            derived_size_bytes: (input.size_bytes as f64 * factor).round() as u64,
        })
        .collect()
}

/// `report.pdf` + `JPG` gives `report.jpg`.
pub fn derived_name(source_name: &str, output_format: &str) -> String {
    let stem = file_stem(source_name).trim();
    let stem = if stem.is_empty() { "untitled" } else { stem };
    format!("{stem}.{}", output_format.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{FileId, OptionValue, OUTPUT_FORMAT};

    fn input(id: u64, name: &str, size_bytes: u64) -> JobInput {
        JobInput {
            file_id: FileId(id),
            name: name.to_string(),
            size_bytes,
            mime_type: None,
            blob: Bytes::new(),
        }
    }

    #[test]
    fn derived_extension_follows_output_format() {
        assert_eq!(derived_name("report.pdf", "JPG"), "report.jpg");
        assert_eq!(derived_name("Q3.Summary.PDF", "DOCX"), "Q3.Summary.docx");
        assert_eq!(derived_name("README", "PDF"), "README.pdf");
        assert_eq!(derived_name(" .pdf", "PDF"), "untitled.pdf");
    }

    #[test]
    fn sizes_scale_with_the_selected_choice() {
        let spec = ToolKey::Compress.spec();
        let mut options = JobOptions::defaults_for(spec);
        options.set(spec, "compression", OptionValue::Choice("high".into()));

        let results = plan_results(
            ToolKey::Compress,
            4,
            &[input(1, "a.pdf", 1000), input(2, "b.pdf", 333)],
            &options,
        );
        assert_eq!(
            results,
            vec![
                ResultFile {
                    id: ResultId { job_id: 4, index: 0 },
                    source_file_id: FileId(1),
                    derived_name: "a.pdf".into(),
                    derived_size_bytes: 400,
                },
                ResultFile {
                    id: ResultId { job_id: 4, index: 1 },
                    source_file_id: FileId(2),
                    derived_name: "b.pdf".into(),
                    derived_size_bytes: 133,
                },
            ]
        );
    }

    #[test]
    fn output_format_applies_to_every_result() {
        let spec = ToolKey::PdfToImage.spec();
        let mut options = JobOptions::defaults_for(spec);
        options.set(spec, OUTPUT_FORMAT, OptionValue::Choice("webp".into()));
        let results = plan_results(
            ToolKey::PdfToImage,
            1,
            &[input(1, "one.pdf", 10), input(2, "two.PDF", 10)],
            &options,
        );
        assert!(results.iter().all(|r| r.derived_name.ends_with(".webp")));
    }
}
