use brickshelf::collection::ApiKeyStatus;
use brickshelf::item::Item;
use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Color as CtColor, Stylize};
use std::io::{self, Write};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

// ═══════════════════════════════════════════════════════════════════════════════
// Clap Styles
// ═══════════════════════════════════════════════════════════════════════════════

fn ansi(color: AnsiColor) -> Style {
    Style::new().fg_color(Some(Color::Ansi(color)))
}

pub fn get_styles() -> Styles {
    Styles::styled()
        .usage(ansi(AnsiColor::Yellow).bold().underline())
        .header(ansi(AnsiColor::Yellow).bold().underline())
        .literal(ansi(AnsiColor::Green).bold())
        .invalid(ansi(AnsiColor::Red).bold())
        .error(ansi(AnsiColor::Red).bold())
        .valid(ansi(AnsiColor::Green).bold())
        .placeholder(ansi(AnsiColor::BrightBlack))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Brick Palette
// ═══════════════════════════════════════════════════════════════════════════════

pub mod colors {
    use crossterm::style::Color;

    const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color::Rgb { r, g, b }
    }

    pub const YELLOW: Color = rgb(255, 205, 3);
    pub const RED: Color = rgb(221, 26, 33);
    pub const BLUE: Color = rgb(0, 108, 183);
    pub const GREEN: Color = rgb(0, 175, 77);
    pub const ORANGE: Color = rgb(245, 125, 32);
    pub const DIM: Color = rgb(128, 128, 128);
    pub const WHITE: Color = rgb(255, 255, 255);
}

pub mod glyphs {
    pub const FRAME_TOP_LEFT: &str = "╔";
    pub const FRAME_TOP_RIGHT: &str = "╗";
    pub const FRAME_BOTTOM_LEFT: &str = "╚";
    pub const FRAME_BOTTOM_RIGHT: &str = "╝";
    pub const FRAME_HORIZONTAL: &str = "═";
    pub const FRAME_VERTICAL: &str = "║";

    pub const LINE: &str = "─";
    pub const BAR: &str = "│";
    pub const ROUND_TOP_LEFT: &str = "╭";
    pub const ROUND_TOP_RIGHT: &str = "╮";
    pub const ROUND_BOTTOM_LEFT: &str = "╰";
    pub const ROUND_BOTTOM_RIGHT: &str = "╯";
    pub const TEE_LEFT: &str = "├";
    pub const TEE_RIGHT: &str = "┤";
    pub const TEE_DOWN: &str = "┬";
    pub const TEE_UP: &str = "┴";
    pub const CROSS: &str = "┼";

    pub const STUD: &str = "●";
    pub const EMPTY_STUD: &str = "○";
    pub const DIAMOND: &str = "◆";
    pub const CHECK: &str = "✓";
    pub const CROSS_MARK: &str = "✗";
    pub const WARNING: &str = "⚠";
    pub const INFO: &str = "ℹ";
    pub const ELLIPSIS: &str = "…";
    pub const BRICK: &str = "▰";
}

// ═══════════════════════════════════════════════════════════════════════════════
// Banner
// ═══════════════════════════════════════════════════════════════════════════════

const BANNER: &str = r#"
    ██████╗ ██████╗ ██╗ ██████╗██╗  ██╗███████╗██╗  ██╗███████╗██╗     ███████╗
    ██╔══██╗██╔══██╗██║██╔════╝██║ ██╔╝██╔════╝██║  ██║██╔════╝██║     ██╔════╝
    ██████╔╝██████╔╝██║██║     █████╔╝ ███████╗███████║█████╗  ██║     █████╗
    ██╔══██╗██╔══██╗██║██║     ██╔═██╗ ╚════██║██╔══██║██╔══╝  ██║     ██╔══╝
    ██████╔╝██║  ██║██║╚██████╗██║  ██╗███████║██║  ██║███████╗███████╗██║
    ╚═════╝ ╚═╝  ╚═╝╚═╝ ╚═════╝╚═╝  ╚═╝╚══════╝╚═╝  ╚═╝╚══════╝╚══════╝╚═╝
"#;

/// Brick colors cycled over the banner rows, two rows each.
const BANNER_STRIPES: [CtColor; 4] = [colors::RED, colors::YELLOW, colors::BLUE, colors::GREEN];

fn print_banner() {
    for (row, line) in BANNER.lines().enumerate() {
        let stripe = BANNER_STRIPES[(row / 2) % BANNER_STRIPES.len()];
        println!("{}", line.with(stripe).bold());
    }
    println!(
        "{}",
        "  ═══════════════════  SET COLLECTION TRACKER  ═══════════════════".with(colors::DIM)
    );
    println!();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Status Lines
// ═══════════════════════════════════════════════════════════════════════════════

fn print_status(glyph: &str, color: CtColor, message: &str) {
    println!(" {} {}", glyph.with(color).bold(), message.with(color));
}

pub fn print_success(message: &str) {
    print_status(glyphs::CHECK, colors::GREEN, message);
}

pub fn print_error(message: &str) {
    print_status(glyphs::CROSS_MARK, colors::RED, message);
}

pub fn print_warning(message: &str) {
    print_status(glyphs::WARNING, colors::ORANGE, message);
}

pub fn print_info(message: &str) {
    print_status(glyphs::INFO, colors::BLUE, message);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Sections
// ═══════════════════════════════════════════════════════════════════════════════

const SECTION_WIDTH: usize = 60;

/// A horizontal rule between two corner glyphs, with an optional title
/// centered in it.
fn print_rule(left: &str, right: &str, title: Option<&str>) {
    let fill = |n: usize| glyphs::LINE.repeat(n).with(colors::YELLOW);
    print!("{}", left.with(colors::YELLOW));
    match title {
        Some(title) => {
            let remaining = SECTION_WIDTH.saturating_sub(title.width() + 4);
            let before = remaining / 2;
            print!("{}", fill(before));
            print!(
                " {} ",
                title.with(colors::YELLOW).bold().attribute(Attribute::Italic)
            );
            print!("{}", fill(remaining - before + 2));
        }
        None => print!("{}", fill(SECTION_WIDTH)),
    }
    println!("{}", right.with(colors::YELLOW));
}

pub fn print_section_header(title: &str) {
    println!();
    print_rule(glyphs::ROUND_TOP_LEFT, glyphs::ROUND_TOP_RIGHT, Some(title));
}

pub fn print_section_footer() {
    print_rule(glyphs::ROUND_BOTTOM_LEFT, glyphs::ROUND_BOTTOM_RIGHT, None);
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        glyphs::STUD.with(colors::BLUE),
        format!("{}:", key).with(colors::DIM),
        value.with(colors::WHITE)
    );
}

fn print_key_value_highlight(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        glyphs::DIAMOND.with(colors::RED),
        format!("{}:", key).with(colors::YELLOW).bold(),
        value.with(colors::GREEN).bold()
    );
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {} {}",
        glyphs::EMPTY_STUD.with(colors::DIM),
        message.with(colors::DIM).attribute(Attribute::Italic)
    );
}

/// Cuts `text` to at most `max_width` terminal columns, ending with an
/// ellipsis when anything was dropped.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let budget = max_width.saturating_sub(glyphs::ELLIPSIS.width());
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push_str(glyphs::ELLIPSIS);
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tables
// ═══════════════════════════════════════════════════════════════════════════════

/// A column heading and the widest a cell may get before it is truncated.
struct Column {
    title: &'static str,
    max_width: usize,
}

/// Boxed table. Cells are truncated to their column's limit and columns
/// shrink to their widest cell.
struct SetTable {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl SetTable {
    fn new(columns: Vec<Column>) -> Self {
        SetTable {
            columns,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, cells: Vec<String>) {
        let row = cells
            .iter()
            .zip(&self.columns)
            .map(|(cell, column)| truncate_to_width(cell, column.max_width))
            .collect();
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.width())
                    .fold(column.title.width(), usize::max)
            })
            .collect()
    }

    fn print_border(widths: &[usize], left: &str, junction: &str, right: &str) {
        let segments: Vec<String> = widths.iter().map(|w| glyphs::LINE.repeat(w + 2)).collect();
        println!(
            "  {}",
            format!("{}{}{}", left, segments.join(junction), right).with(colors::YELLOW)
        );
    }

    fn print_row<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>, header: bool) {
        print!("  {}", glyphs::BAR.with(colors::YELLOW));
        for (cell, width) in cells.zip(widths) {
            let padded = format!("{}{}", cell, " ".repeat(width.saturating_sub(cell.width())));
            if header {
                print!(" {} ", padded.with(colors::YELLOW).bold());
            } else {
                print!(" {} ", padded.with(colors::WHITE));
            }
            print!("{}", glyphs::BAR.with(colors::YELLOW));
        }
        println!();
    }

    fn print(&self) {
        let widths = self.widths();
        Self::print_border(
            &widths,
            glyphs::ROUND_TOP_LEFT,
            glyphs::TEE_DOWN,
            glyphs::ROUND_TOP_RIGHT,
        );
        Self::print_row(&widths, self.columns.iter().map(|c| c.title), true);
        Self::print_border(&widths, glyphs::TEE_LEFT, glyphs::CROSS, glyphs::TEE_RIGHT);
        for row in &self.rows {
            Self::print_row(&widths, row.iter().map(String::as_str), false);
        }
        Self::print_border(
            &widths,
            glyphs::ROUND_BOTTOM_LEFT,
            glyphs::TEE_UP,
            glyphs::ROUND_BOTTOM_RIGHT,
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Collection Display
// ═══════════════════════════════════════════════════════════════════════════════

const CODE_COLUMN_WIDTH: usize = 16;
const NAME_COLUMN_WIDTH: usize = 40;
const NOTE_COLUMN_WIDTH: usize = 24;

/// Prints one theme's sets as a table under a theme heading.
pub fn print_theme_group(theme: &str, items: &[&Item]) {
    println!(
        "  {} {} {}",
        glyphs::DIAMOND.with(colors::RED),
        theme.with(colors::YELLOW).bold(),
        format!("({})", items.len()).with(colors::DIM)
    );

    let mut table = SetTable::new(vec![
        Column {
            title: "Code",
            max_width: CODE_COLUMN_WIDTH,
        },
        Column {
            title: "Name",
            max_width: NAME_COLUMN_WIDTH,
        },
        Column {
            title: "Requested as",
            max_width: NAME_COLUMN_WIDTH,
        },
        Column {
            title: "Note",
            max_width: NOTE_COLUMN_WIDTH,
        },
    ]);
    for item in items {
        table.push(vec![
            item.code.clone(),
            item.resolved_name.clone(),
            item.requested_name.clone(),
            item.note.clone().unwrap_or_default(),
        ]);
    }
    table.print();
    println!();
}

/// Prints every field of one set.
pub fn print_item_details(item: &Item, theme: &str, image_url: &str) {
    print_section_header(&format!("Set {}", item.code));
    print_key_value_highlight("Name", &item.resolved_name);
    print_key_value("Requested as", &item.requested_name);
    print_key_value("Theme", theme);
    print_key_value("Product page", &item.product_url);
    print_key_value("Image", image_url);
    if let Some(note) = &item.note {
        print_key_value("Note", note);
    }
    print_section_footer();
}

pub fn print_api_key_status(status: &ApiKeyStatus) {
    match status {
        ApiKeyStatus::Stored(masked) => print_key_value("API key (stored)", masked),
        ApiKeyStatus::Configured(masked) => print_key_value("API key (config file)", masked),
        ApiKeyStatus::Missing => print_warning(
            "No API key set. Sets are saved without catalog details until you run 'api-key set'.",
        ),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Prompt
// ═══════════════════════════════════════════════════════════════════════════════

/// Three bricks in the primary colors.
pub fn get_prompt() -> String {
    format!(
        "{}{}{} ",
        glyphs::BRICK.with(colors::RED).bold(),
        glyphs::BRICK.with(colors::YELLOW).bold(),
        glyphs::BRICK.with(colors::BLUE).bold(),
    )
}

/// Asks a yes/no question on stdout and reads the answer from stdin.
pub fn confirm(question: &str) -> io::Result<bool> {
    print!(
        " {} {} {} ",
        "?".with(colors::ORANGE).bold(),
        question.with(colors::WHITE),
        "[y/N]".with(colors::DIM)
    );
    flush();
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Welcome Box
// ═══════════════════════════════════════════════════════════════════════════════

const WELCOME_WIDTH: usize = 64;

fn print_frame_edge(left: &str, right: &str) {
    println!(
        "  {}",
        format!(
            "{}{}{}",
            left,
            glyphs::FRAME_HORIZONTAL.repeat(WELCOME_WIDTH),
            right
        )
        .with(colors::BLUE)
    );
}

/// One framed line. `visible` is the content's width on screen, which
/// differs from its length once styled.
fn print_frame_line(content: impl std::fmt::Display, visible: usize) {
    let side = glyphs::FRAME_VERTICAL.with(colors::BLUE);
    println!(
        "  {}{}{}{}",
        side,
        content,
        " ".repeat(WELCOME_WIDTH.saturating_sub(visible)),
        side
    );
}

pub fn print_welcome(db_path: &str, set_count: usize) {
    print_banner();

    let set_count = set_count.to_string();
    let facts = [
        ("Database", db_path),
        ("Sets", set_count.as_str()),
        ("Version", env!("APP_VERSION")),
    ];

    print_frame_edge(glyphs::FRAME_TOP_LEFT, glyphs::FRAME_TOP_RIGHT);
    for (key, value) in facts {
        let value = truncate_to_width(value, WELCOME_WIDTH.saturating_sub(key.width() + 4));
        print_frame_line(
            format!("  {} {}", format!("{}:", key).with(colors::DIM), value),
            key.width() + value.width() + 4,
        );
    }
    print_frame_line("", 0);
    let hint = "  Type 'help' for available commands";
    print_frame_line(hint.with(colors::DIM), hint.width());
    print_frame_edge(glyphs::FRAME_BOTTOM_LEFT, glyphs::FRAME_BOTTOM_RIGHT);
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

const HELP_GROUPS: &[(&str, CtColor, &[&str])] = &[
    ("Collection", colors::RED, &["add", "delete", "clear", "sync"]),
    ("Browse", colors::YELLOW, &["list", "themes", "show"]),
    ("Library & Settings", colors::BLUE, &["import", "export", "api-key"]),
    ("System", colors::ORANGE, &["where", "help", "exit"]),
];

pub fn print_help(commands: &[CommandHelp]) {
    print_section_header("Available Commands");
    println!();

    for &(title, color, names) in HELP_GROUPS {
        println!("  {} {}", glyphs::DIAMOND.with(color), title.with(color).bold());
        for cmd in commands.iter().filter(|c| names.contains(&c.name)) {
            println!(
                "      {} {}  {}",
                cmd.name.with(colors::GREEN).bold(),
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
    println!(
        "  {} {}",
        glyphs::BRICK.with(colors::RED),
        "Goodbye! Happy building".with(colors::YELLOW).bold()
    );
    println!();
}

pub fn flush() {
    let _ = io::stdout().flush();
}
