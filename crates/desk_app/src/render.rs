use desk_core::{
    format_size, CompletedJobSnapshot, DeskViewModel, JobPhase, Notice, NoticeLevel, OptionKind,
    ToolKey,
};

pub fn notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Success => println!("[ok]    {}", notice.message),
        NoticeLevel::Info => println!("[info]  {}", notice.message),
        NoticeLevel::Warning => eprintln!("[warn]  {}", notice.message),
        NoticeLevel::Error => eprintln!("[error] {}", notice.message),
    }
}

pub fn progress(job_id: u64, processed: usize, total: usize) {
    if processed > 0 {
        println!("        job {job_id}: {processed}/{total} file(s) processed");
    }
}

pub fn tools() {
    for key in ToolKey::ALL {
        let spec = key.spec();
        println!("{:<14} {}", key.as_str(), spec.label);
        let mut limits = format!(
            "accepts {} up to {}",
            spec.accept.describe_extensions(),
            format_size(spec.accept.max_size_bytes)
        );
        if let Some(max_count) = spec.accept.max_count {
            limits.push_str(&format!(", at most {max_count} file(s)"));
        }
        println!("{:<14} {limits}", "");
        println!(
            "{:<14} output_format: {} (default {})",
            "",
            spec.target_formats.join(", "),
            spec.default_format
        );
        for option in spec.options {
            println!("{:<14} {}: {}", "", option.key, describe_kind(option.kind));
        }
    }
}

fn describe_kind(kind: OptionKind) -> String {
    match kind {
        OptionKind::Choice { allowed, default } => {
            format!("{} (default {default})", allowed.join(", "))
        }
        OptionKind::Flag { default } => format!("on/off (default {})", on_off(default)),
        OptionKind::Integer { default } => format!("number (default {default})"),
        OptionKind::Text { default } if default.is_empty() => "text".to_string(),
        OptionKind::Text { default } => format!("text (default \"{default}\")"),
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Final state of a `run` session.
pub fn summary(view: &DeskViewModel) {
    println!();
    println!(
        "{} | {} | {} file(s), {}",
        view.tool_label,
        phase_label(view.phase),
        view.files.len(),
        format_size(view.total_input_bytes)
    );
    if let Some(intake) = &view.last_intake {
        for rejected in &intake.rejected {
            println!("  skipped {} ({:?})", rejected.file_name, rejected.kind);
        }
    }
    if !view.results.is_empty() {
        println!("Results ({}):", format_size(view.total_result_bytes));
        for row in &view.results {
            println!(
                "  {:<32} {:>10}  from {}",
                row.derived_name,
                format_size(row.derived_size_bytes),
                row.source_name.as_deref().unwrap_or("?")
            );
        }
    }
    if let Some(banner) = &view.error_banner {
        eprintln!("Error: {banner}");
    }
}

pub fn history(completed: &[CompletedJobSnapshot]) {
    if completed.is_empty() {
        println!("No completed jobs yet.");
        return;
    }
    for job in completed.iter().rev() {
        println!(
            "{}  {}",
            job.finished_at.as_deref().unwrap_or("(unknown time)"),
            job.tool.spec().label
        );
        for entry in &job.entries {
            println!(
                "    {} -> {} ({})",
                entry.source_name,
                entry.derived_name,
                format_size(entry.derived_size_bytes)
            );
        }
    }
}

fn phase_label(phase: JobPhase) -> &'static str {
    match phase {
        JobPhase::Idle => "Idle",
        JobPhase::Validated => "Ready",
        JobPhase::Running => "Running",
        JobPhase::Completed => "Completed",
        JobPhase::Failed => "Failed",
    }
}
