//! Self-contained HTML report: one collapsible section per task with a
//! sortable module table, and per-function child rows.

use std::fmt::Write;

use crate::model::{Function, MemoryUsage, Module, Task};
use crate::report::format_kib;
use crate::totals::{share, MemoryCapacity};

const STYLE: &str = include_str!("assets/report.css");
const SCRIPT: &str = include_str!("assets/report.js");

/// Figure space keeps right-aligned byte columns lined up in proportional fonts.
const FIGURE_SPACE: &str = "&#8199;";

/// Render the full page. `title` prefixes the page heading.
pub fn render(usage: &MemoryUsage, capacity: &MemoryCapacity, title: &str) -> String {
    let used = usage.used();
    let mut out = String::new();

    out.push_str("<!DOCTYPE html>\n<html>\n\n<head>\n");
    out.push_str("    <meta charset='utf-8'>\n");
    out.push_str("    <meta http-equiv='X-UA-Compatible' content='IE=edge'>\n");
    let _ = writeln!(out, "    <title>{} Memory Usage</title>", escape(title));
    out.push_str("    <meta name='viewport' content='width=device-width, initial-scale=1'>\n");
    let _ = writeln!(out, "    <style>\n{STYLE}    </style>\n</head>\n\n<body>");

    let _ = writeln!(
        out,
        "    <h1>{} Memory Usage<span class=right> RAM: {} KB ({}%) Flash: {} KB ({}%) EXRAM: {} KB ({}%)</span></h1>",
        escape(title),
        format_kib(used.ram),
        percent(used.ram, capacity.ram),
        format_kib(used.flash),
        percent(used.flash, capacity.flash),
        format_kib(used.exram),
        percent(used.exram, capacity.exram),
    );
    out.push_str(SELECTOR);

    let mut tasks: Vec<&Task> = usage.tasks.iter().collect();
    tasks.sort_by(|a, b| a.name.cmp(&b.name));
    for task in tasks {
        render_task(&mut out, task, capacity);
    }

    let _ = writeln!(out, "</body>\n<script type=\"text/javascript\">\n{SCRIPT}</script>\n</html>");
    out
}

const SELECTOR: &str = r#"  <section id="Selector">
    <label for="order">Sort by:</label>
    <select id="order" onchange="sortTasksByKey(this.value)">
      <option value='Name'>Name</option>
      <option value='RAM'>RAM</option>
      <option value='Flash'>Flash</option>
      <option value='EXRAM'>EXRAM</option>
      <option value='Stack'>Stack</option>
    </select>
  </section>
"#;

fn render_task(out: &mut String, task: &Task, capacity: &MemoryCapacity) {
    let _ = writeln!(
        out,
        "<section class=\"accordion\">\n  <button class=\"toggler_1\"><span class=\"left\"><b>{}</b></span>\
         <span class=\"right\">Total RAM: {} B ({}%) Total Flash: {} B ({}%) EXRAM: {} B ({}%) Stack: {} B</span></button>",
        escape(&task.name),
        padded(task.total_ram()),
        percent(task.total_ram(), capacity.ram),
        padded(task.total_flash()),
        percent(task.total_flash(), capacity.flash),
        padded(task.exram),
        percent(task.exram, capacity.exram),
        padded(task.stack),
    );
    out.push_str(
        r#"  <div>
    <table class="content">
      <colgroup>
        <col>
        <col class="fixed">
        <col class="fixed">
      </colgroup>
      <thead>
        <tr>
          <th class="Alpha">Module</th>
          <th class="Numeric">RAM</th>
          <th class="Numeric">Flash</th>
        </tr>
      </thead>
      <tbody>
"#,
    );

    let mut modules: Vec<&Module> = task.modules.iter().collect();
    modules.sort_by(|a, b| a.name.cmp(&b.name));
    for module in modules {
        row(out, "parent", &module.name, module.ram_size, module.flash_size, capacity);
        let mut functions: Vec<&Function> = module.functions.iter().collect();
        functions.sort_by(|a, b| a.name.cmp(&b.name));
        for function in functions {
            row(out, "child", &function.name, function.ram_size, function.flash_size, capacity);
        }
    }

    out.push_str("      </tbody>\n    </table>\n  </div>\n</section>\n");
}

fn row(out: &mut String, class: &str, name: &str, ram: u64, flash: u64, capacity: &MemoryCapacity) {
    let _ = writeln!(
        out,
        "        <tr class=\"{class}\">\n          <td class=\"name\">{}</td>\n          <td>{} B ({}%)</td>\n          <td>{} B ({}%)</td>\n        </tr>",
        escape(name),
        ram,
        percent(ram, capacity.ram),
        flash,
        percent(flash, capacity.flash),
    );
}

/// Zero-padded percentage, e.g. `07.50`.
fn percent(part: u64, whole: u64) -> String {
    format!("{:05.2}", share(part, whole))
}

fn padded(bytes: u64) -> String {
    format!("{bytes:>6}").replace(' ', FIGURE_SPACE)
}

/// Minimal HTML escaping for text content; demangled C++ names carry `<`, `>` and `&`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
