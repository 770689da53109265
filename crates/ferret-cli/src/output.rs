use ferret_proc::ProcStatus;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Surface a child's failure as a CLI error so the exit code reflects it.
pub fn exit_code_hint(status: &ProcStatus) -> anyhow::Result<()> {
    match status {
        ProcStatus::Exited { code } if *code != 0 => {
            anyhow::bail!("action exited with code {code}")
        }
        ProcStatus::Failed { reason } => anyhow::bail!("action failed: {reason}"),
        _ => Ok(()),
    }
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let format_row = |cells: Vec<String>| {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:width$}", c, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!(
        "{}",
        format_row(headers.iter().map(|h| h.to_string()).collect())
    );
    println!(
        "{}",
        format_row(widths.iter().map(|w| "-".repeat(*w)).collect())
    );
    for row in rows {
        println!("{}", format_row(row.clone()));
    }
}
