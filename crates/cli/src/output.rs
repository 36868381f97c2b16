//! Rendering of exported records.

use anyhow::{Context, Result};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use orgsync_core::{DepartmentRecord, UserRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    Table,
    /// Pretty-printed JSON array.
    Json,
}

pub fn print_departments(records: &[DepartmentRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(records),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["ID", "Name", "Pinyin", "Parent", "Namespaced"]);
            for d in records {
                table.add_row(vec![
                    Cell::new(d.id),
                    Cell::new(&d.name),
                    Cell::new(&d.name_pinyin),
                    Cell::new(d.parent_id),
                    Cell::new(&d.namespaced_id),
                ]);
            }
            println!("{}", table);
            println!("{} departments", records.len());
            Ok(())
        }
    }
}

pub fn print_users(records: &[UserRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(records),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec![
                "User ID",
                "Name",
                "Username",
                "Email",
                "Biz email",
                "Departments",
            ]);
            for u in records {
                table.add_row(vec![
                    Cell::new(&u.userid),
                    Cell::new(&u.name),
                    Cell::new(&u.username),
                    Cell::new(u.email.as_deref().unwrap_or("—")),
                    Cell::new(u.biz_email.as_deref().unwrap_or("—")),
                    Cell::new(u.department_ids.join(", ")),
                ]);
            }
            println!("{}", table);
            println!("{} users", records.len());
            Ok(())
        }
    }
}

fn print_json<T: serde::Serialize>(records: &[T]) -> Result<()> {
    let json = serde_json::to_string_pretty(records).context("failed to serialize records")?;
    println!("{}", json);
    Ok(())
}
