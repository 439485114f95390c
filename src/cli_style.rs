use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Color as CtColor, Stylize};
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;

use waste_console::api::{BinRecord, UserRecord};
use waste_console::bin_status::{BinState, FillIndicator, LidState};
use waste_console::forms::FieldErrors;
use waste_console::notifications::{Notification, NotificationLevel};
use waste_console::session::Menu;

// ═══════════════════════════════════════════════════════════════════════════════
// Clap Styles
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_styles() -> Styles {
    let bold = |color| Style::new().bold().fg_color(Some(Color::Ansi(color)));
    Styles::styled()
        .usage(bold(AnsiColor::Green).underline())
        .header(bold(AnsiColor::Green).underline())
        .literal(bold(AnsiColor::Cyan))
        .invalid(bold(AnsiColor::Red))
        .error(bold(AnsiColor::Red))
        .valid(bold(AnsiColor::Cyan))
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Color Palette
// ═══════════════════════════════════════════════════════════════════════════════

pub mod colors {
    use crossterm::style::Color;

    pub const TEAL: Color = Color::Rgb {
        r: 0,
        g: 168,
        b: 150,
    };
    pub const LEAF: Color = Color::Rgb {
        r: 76,
        g: 200,
        b: 80,
    };
    pub const AMBER: Color = Color::Rgb {
        r: 255,
        g: 193,
        b: 7,
    };
    pub const RED: Color = Color::Rgb {
        r: 239,
        g: 83,
        b: 80,
    };
    pub const SKY: Color = Color::Rgb {
        r: 100,
        g: 181,
        b: 246,
    };
    pub const DIM: Color = Color::Rgb {
        r: 128,
        g: 128,
        b: 128,
    };
    pub const WHITE: Color = Color::Rgb {
        r: 255,
        g: 255,
        b: 255,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Box Drawing Characters
// ═══════════════════════════════════════════════════════════════════════════════

pub mod box_chars {
    pub const DOUBLE_TOP_LEFT: &str = "╔";
    pub const DOUBLE_TOP_RIGHT: &str = "╗";
    pub const DOUBLE_BOTTOM_LEFT: &str = "╚";
    pub const DOUBLE_BOTTOM_RIGHT: &str = "╝";
    pub const DOUBLE_HORIZONTAL: &str = "═";
    pub const DOUBLE_VERTICAL: &str = "║";

    pub const HORIZONTAL: &str = "─";
    pub const VERTICAL: &str = "│";
    pub const ROUND_TOP_LEFT: &str = "╭";
    pub const ROUND_TOP_RIGHT: &str = "╮";
    pub const ROUND_BOTTOM_LEFT: &str = "╰";
    pub const ROUND_BOTTOM_RIGHT: &str = "╯";
    pub const T_LEFT: &str = "├";
    pub const T_RIGHT: &str = "┤";
    pub const T_TOP: &str = "┬";
    pub const T_BOTTOM: &str = "┴";
    pub const CROSS: &str = "┼";

    pub const ARROW_RIGHT: &str = "▶";
    pub const BULLET: &str = "●";
    pub const BULLET_EMPTY: &str = "○";
    pub const DIAMOND: &str = "◆";
    pub const CHECK: &str = "✓";
    pub const CROSS_MARK: &str = "✗";
    pub const BAR_FULL: &str = "█";
    pub const BAR_EMPTY: &str = "░";
}

// ═══════════════════════════════════════════════════════════════════════════════
// Status Indicators
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_success(message: &str) {
    println!(
        " {} {}",
        box_chars::CHECK.with(colors::LEAF).bold(),
        message.with(colors::LEAF)
    );
}

pub fn print_error(message: &str) {
    println!(
        " {} {}",
        box_chars::CROSS_MARK.with(colors::RED).bold(),
        message.with(colors::RED)
    );
}

pub fn print_warning(message: &str) {
    println!(
        " {} {}",
        "⚠".with(colors::AMBER).bold(),
        message.with(colors::AMBER)
    );
}

pub fn print_info(message: &str) {
    println!(
        " {} {}",
        "ℹ".with(colors::SKY).bold(),
        message.with(colors::SKY)
    );
}

pub fn print_notifications(notifications: &[Notification]) {
    for notification in notifications {
        match notification.level {
            NotificationLevel::Success => print_success(&notification.text),
            NotificationLevel::Error => print_error(&notification.text),
        }
    }
}

pub fn print_field_errors(errors: &FieldErrors) {
    for error in errors.iter() {
        println!(
            "   {} {} {}*",
            box_chars::BULLET.with(colors::RED),
            format!("{}:", error.field).with(colors::DIM),
            error.message.as_str().with(colors::RED)
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Sections
// ═══════════════════════════════════════════════════════════════════════════════

const SECTION_WIDTH: usize = 60;

pub fn print_section_header(title: &str) {
    let title_len = title.width();
    let left = SECTION_WIDTH.saturating_sub(title_len + 4) / 2;
    let right = SECTION_WIDTH.saturating_sub(title_len + 4 + left);

    println!();
    println!(
        "{}{} {} {}{}",
        box_chars::ROUND_TOP_LEFT.with(colors::TEAL),
        box_chars::HORIZONTAL.repeat(left).with(colors::TEAL),
        title.with(colors::TEAL).bold().attribute(Attribute::Italic),
        box_chars::HORIZONTAL.repeat(right).with(colors::TEAL),
        box_chars::ROUND_TOP_RIGHT.with(colors::TEAL)
    );
}

pub fn print_section_footer() {
    println!(
        "{}{}{}",
        box_chars::ROUND_BOTTOM_LEFT.with(colors::TEAL),
        box_chars::HORIZONTAL.repeat(SECTION_WIDTH).with(colors::TEAL),
        box_chars::ROUND_BOTTOM_RIGHT.with(colors::TEAL)
    );
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        box_chars::BULLET.with(colors::TEAL),
        format!("{}:", key).with(colors::DIM),
        value.with(colors::WHITE)
    );
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {} {}",
        box_chars::BULLET_EMPTY.with(colors::DIM),
        message.with(colors::DIM).attribute(Attribute::Italic)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Menubar
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_menu(menu: &Menu) {
    print_section_header(menu.title);
    if menu.caption.is_empty() {
        print_empty_list("not logged in");
    } else {
        println!(
            "  {} {}",
            box_chars::DIAMOND.with(colors::AMBER),
            capitalize(&menu.caption).with(colors::WHITE).bold()
        );
    }
    for link in &menu.links {
        println!(
            "      {}  {} {}",
            box_chars::ARROW_RIGHT.with(colors::TEAL),
            link.label.with(colors::LEAF).bold(),
            link.route.path().with(colors::DIM)
        );
    }
    if !menu.caption.is_empty() {
        println!(
            "      {}  {}",
            box_chars::ARROW_RIGHT.with(colors::RED),
            "Logout".with(colors::RED).bold()
        );
    }
    print_section_footer();
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Table Display
// ═══════════════════════════════════════════════════════════════════════════════

pub struct TableBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    widths: Vec<usize>,
}

impl TableBuilder {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            widths: headers.iter().map(|h| h.width()).collect(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        for (width, cell) in self.widths.iter_mut().zip(&row) {
            *width = (*width).max(cell.width());
        }
        self.rows.push(row);
    }

    fn border(&self, left: &str, junction: &str, right: &str) {
        let segments: Vec<String> = self
            .widths
            .iter()
            .map(|w| box_chars::HORIZONTAL.repeat(w + 2))
            .collect();
        println!(
            "{}",
            format!("{}{}{}", left, segments.join(junction), right).with(colors::TEAL)
        );
    }

    fn line(&self, cells: &[String], color: CtColor, bold: bool) {
        print!("{}", box_chars::VERTICAL.with(colors::TEAL));
        for (i, width) in self.widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let padded = format!(" {}{} ", cell, " ".repeat(width.saturating_sub(cell.width())));
            if bold {
                print!("{}", padded.with(color).bold());
            } else {
                print!("{}", padded.with(color));
            }
            print!("{}", box_chars::VERTICAL.with(colors::TEAL));
        }
        println!();
    }

    pub fn print(&self) {
        self.border(
            box_chars::ROUND_TOP_LEFT,
            box_chars::T_TOP,
            box_chars::ROUND_TOP_RIGHT,
        );
        self.line(&self.headers, colors::TEAL, true);
        self.border(box_chars::T_LEFT, box_chars::CROSS, box_chars::T_RIGHT);
        for row in &self.rows {
            self.line(row, colors::WHITE, false);
        }
        self.border(
            box_chars::ROUND_BOTTOM_LEFT,
            box_chars::T_BOTTOM,
            box_chars::ROUND_BOTTOM_RIGHT,
        );
    }
}

pub fn print_users(users: &[UserRecord]) {
    if users.is_empty() {
        print_empty_list("no users");
        return;
    }
    let mut table = TableBuilder::new(&["#", "Id", "Role", "First Name", "Last Name", "Email", "Batch"]);
    for (i, user) in users.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            user.id.clone(),
            capitalize(user.role.as_str()),
            capitalize(&user.first_name),
            capitalize(&user.last_name),
            user.email.clone(),
            user.batch.clone(),
        ]);
    }
    table.print();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Bin Cards
// ═══════════════════════════════════════════════════════════════════════════════

fn indicator_color(indicator: Option<FillIndicator>) -> CtColor {
    match indicator {
        Some(FillIndicator::Green) => colors::LEAF,
        Some(FillIndicator::Yellow) => colors::AMBER,
        Some(FillIndicator::Red) => colors::RED,
        None => colors::DIM,
    }
}

fn fill_bar(percentage: Option<f64>, width: usize) -> String {
    let filled = percentage
        .map(|p| ((p.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize)
        .unwrap_or(0);
    format!(
        "{}{}",
        box_chars::BAR_FULL.repeat(filled),
        box_chars::BAR_EMPTY.repeat(width - filled)
    )
}

fn reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{}{}", v, unit),
        None => "-".to_string(),
    }
}

pub fn print_bin_card(record: &BinRecord, state: &BinState) {
    let color = indicator_color(state.color_indicator);
    let lid = match state.lid_state {
        LidState::Opened => state.lid_state.as_str().with(colors::AMBER).bold(),
        LidState::Closed => state.lid_state.as_str().with(colors::WHITE),
    };

    println!(
        "  {} {} {}",
        box_chars::BULLET.with(color),
        record.bin_name.as_str().with(colors::WHITE).bold(),
        format!(
            "({}, {} / {})",
            record.bin_location,
            record.bin_color,
            record.bin_color.waste_category()
        )
        .with(colors::DIM)
    );
    println!("      {} {}", "id:".with(colors::DIM), record.id.as_str().with(colors::DIM));
    println!("      {} {}", "Lid:".with(colors::DIM), lid);
    println!(
        "      {} {}",
        "Height:".with(colors::DIM),
        reading(state.height, " cm").with(colors::WHITE)
    );
    println!(
        "      {} {} {}",
        "Percentage:".with(colors::DIM),
        fill_bar(state.percentage, 20).with(color),
        reading(state.percentage, "%").with(color).bold()
    );
    if let Some(anomaly) = state.anomaly {
        println!(
            "      {} {}",
            "⚠".with(colors::AMBER),
            anomaly.to_string().with(colors::AMBER)
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Prompt
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_prompt(path: &str) -> String {
    format!(
        "{} {} ",
        format!("[{}]", path).with(colors::DIM),
        "❯".with(colors::TEAL).bold()
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// Welcome
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_welcome(lines: &[(&str, String)]) {
    let box_width: usize = 64;
    let row = |content: String, visible: usize| {
        println!(
            "  {}{}{}{}",
            box_chars::DOUBLE_VERTICAL.with(colors::TEAL),
            content,
            " ".repeat(box_width.saturating_sub(visible)),
            box_chars::DOUBLE_VERTICAL.with(colors::TEAL)
        );
    };

    println!();
    println!(
        "  {}{}{}",
        box_chars::DOUBLE_TOP_LEFT.with(colors::TEAL),
        box_chars::DOUBLE_HORIZONTAL.repeat(box_width).with(colors::TEAL),
        box_chars::DOUBLE_TOP_RIGHT.with(colors::TEAL)
    );

    let title = format!("  Waste Management System  v{}", env!("CARGO_PKG_VERSION"));
    let visible = title.width();
    row(title.with(colors::LEAF).bold().to_string(), visible);
    row(String::new(), 0);

    for (key, value) in lines {
        let visible = key.width() + 1 + 1 + value.width() + 2;
        row(
            format!("  {} {}", format!("{}:", key).with(colors::DIM), value),
            visible,
        );
    }

    row(String::new(), 0);
    let help = "  Type 'help' for available commands";
    row(help.with(colors::DIM).to_string(), help.width());

    println!(
        "  {}{}{}",
        box_chars::DOUBLE_BOTTOM_LEFT.with(colors::TEAL),
        box_chars::DOUBLE_HORIZONTAL.repeat(box_width).with(colors::TEAL),
        box_chars::DOUBLE_BOTTOM_RIGHT.with(colors::TEAL)
    );
    println!();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Help
// ═══════════════════════════════════════════════════════════════════════════════

pub struct CommandHelp {
    pub name: &'static str,
    pub args: &'static str,
    pub description: &'static str,
}

pub fn print_help(groups: &[(&str, &[CommandHelp])]) {
    print_section_header("Available Commands");
    let palette = [colors::TEAL, colors::LEAF, colors::AMBER, colors::SKY];
    for (i, (title, commands)) in groups.iter().enumerate() {
        let color = palette[i % palette.len()];
        println!(
            "  {} {}",
            box_chars::DIAMOND.with(color),
            title.with(color).bold()
        );
        for cmd in commands.iter() {
            println!(
                "      {} {}  {}",
                cmd.name.with(colors::LEAF).bold(),
                cmd.args.with(colors::DIM),
                cmd.description.with(colors::WHITE)
            );
        }
        println!();
    }
    print_section_footer();
}

pub fn print_goodbye() {
    println!();
    println!("  {}", "Goodbye!".with(colors::TEAL).bold());
    println!();
}

pub fn flush() {
    let _ = io::stdout().flush();
}
