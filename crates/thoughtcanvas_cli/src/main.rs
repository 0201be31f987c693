//! Terminal front end for the notebook core.
//!
//! # Responsibility
//! - Map subcommands onto `NotebookStore` operations against a SQLite file.
//! - Print store notifications after each applied mutation.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::info;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thoughtcanvas_core::model::checklist::ChecklistPath;
use thoughtcanvas_core::service::{content_forms, json_io};
use thoughtcanvas_core::{
    default_log_level, init_logging, render_note, resolve_db_path, ContentItem, DrawingCanvas,
    NotebookStore, SqliteLocalStorage, TableEdit, ViewMode,
};

type Store = NotebookStore<SqliteLocalStorage>;

fn main() -> ExitCode {
    let matches = cli().get_matches();
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn cli() -> Command {
    let note_line = |name: &'static str, about: &'static str, value: Arg| {
        Command::new(name)
            .about(about)
            .arg(Arg::new("note").required(true).help("Note id"))
            .arg(Arg::new("line").required(true).help("Line id"))
            .arg(value)
    };

    Command::new("thoughtcanvas")
        .version(thoughtcanvas_core::core_version())
        .about("ThoughtCanvas+ notebooks from the terminal")
        .subcommand_required(true)
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Database file (defaults to THOUGHTCANVAS_DB_PATH or the temp dir)"),
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Absolute directory for rolling log files"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("trace|debug|info|warn|error"),
        )
        .subcommand(Command::new("notebooks").about("List notebooks"))
        .subcommand(
            Command::new("notes")
                .about("List notes of a notebook")
                .arg(Arg::new("notebook").required(true).help("Notebook id")),
        )
        .subcommand(
            Command::new("show")
                .about("Render a note")
                .arg(Arg::new("note").required(true).help("Note id"))
                .arg(
                    Arg::new("detail")
                        .long("detail")
                        .action(ArgAction::SetTrue)
                        .help("Expand rich content in full"),
                ),
        )
        .subcommand(
            Command::new("new-notebook")
                .about("Create a notebook")
                .arg(Arg::new("title").required(true))
                .arg(Arg::new("description").long("description")),
        )
        .subcommand(
            Command::new("new-note")
                .about("Create a note in a notebook")
                .arg(Arg::new("notebook").required(true).help("Notebook id"))
                .arg(Arg::new("title").required(true)),
        )
        .subcommand(
            Command::new("rename-note")
                .about("Rename a note")
                .arg(Arg::new("note").required(true).help("Note id"))
                .arg(Arg::new("title").required(true)),
        )
        .subcommand(
            Command::new("delete-note")
                .about("Delete a note")
                .arg(Arg::new("note").required(true).help("Note id")),
        )
        .subcommand(
            Command::new("add-line")
                .about("Append a line to a note")
                .arg(Arg::new("note").required(true).help("Note id"))
                .arg(Arg::new("text").required(true)),
        )
        .subcommand(note_line(
            "edit-line",
            "Replace the text of a line",
            Arg::new("text").required(true),
        ))
        .subcommand(
            Command::new("delete-line")
                .about("Delete a line")
                .arg(Arg::new("note").required(true).help("Note id"))
                .arg(Arg::new("line").required(true).help("Line id")),
        )
        .subcommand(note_line(
            "add-link",
            "Attach a link to a line",
            Arg::new("url").required(true),
        ))
        .subcommand(note_line(
            "add-markdown",
            "Attach markdown to a line",
            Arg::new("source").required(true),
        ))
        .subcommand(note_line(
            "add-checklist",
            "Attach a checklist given as [{text, checked?, children?}] JSON",
            Arg::new("json").required(true),
        ))
        .subcommand(note_line(
            "add-table",
            "Attach a table given as {headers, rows} JSON",
            Arg::new("json").required(true),
        ))
        .subcommand(
            note_line(
                "attach",
                "Attach a file; images are embedded as data URLs",
                Arg::new("path")
                    .required(true)
                    .value_parser(value_parser!(PathBuf)),
            )
            .arg(
                Arg::new("mime")
                    .long("mime")
                    .help("MIME type (guessed from the extension when omitted)"),
            ),
        )
        .subcommand(
            note_line(
                "check",
                "Check or uncheck a checklist item",
                Arg::new("item").required(true).help("Item id"),
            )
            .arg(
                Arg::new("parent")
                    .long("parent")
                    .help("Parent item id for nested items"),
            )
            .arg(
                Arg::new("uncheck")
                    .long("uncheck")
                    .action(ArgAction::SetTrue),
            ),
        )
        .subcommand(
            note_line(
                "edit-item",
                "Change the text of a checklist item",
                Arg::new("item").required(true).help("Item id"),
            )
            .arg(
                Arg::new("parent")
                    .long("parent")
                    .help("Parent item id for nested items"),
            )
            .arg(Arg::new("text").long("text").required(true)),
        )
        .subcommand(
            note_line(
                "edit-table",
                "Apply one edit to a table",
                Arg::new("action").required(true).value_parser([
                    "add-column",
                    "remove-column",
                    "add-row",
                    "remove-row",
                    "set-header",
                    "set-cell",
                ]),
            )
            .arg(
                Arg::new("index")
                    .long("index")
                    .value_parser(value_parser!(usize))
                    .help("Column index, or row index for remove-row"),
            )
            .arg(
                Arg::new("row")
                    .long("row")
                    .value_parser(value_parser!(usize)),
            )
            .arg(
                Arg::new("column")
                    .long("column")
                    .value_parser(value_parser!(usize)),
            )
            .arg(Arg::new("value").long("value").help("Header or cell text")),
        )
        .subcommand(
            note_line(
                "draw",
                "Draw strokes given as `x,y;x,y;...` and attach the PNG",
                Arg::new("stroke").required(true).num_args(1..),
            )
            .arg(Arg::new("color").long("color").help("Stroke colour as #rrggbb"))
            .arg(
                Arg::new("brush")
                    .long("brush")
                    .value_parser(value_parser!(u32))
                    .help("Brush size from 1 to 20"),
            ),
        )
        .subcommand(
            Command::new("link")
                .about("Link one note to another")
                .arg(Arg::new("source").required(true))
                .arg(Arg::new("target").required(true)),
        )
        .subcommand(
            Command::new("unlink")
                .about("Remove a link between notes")
                .arg(Arg::new("source").required(true))
                .arg(Arg::new("target").required(true)),
        )
        .subcommand(
            Command::new("export")
                .about("Print all notebooks as JSON")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write to a file instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Import JSON from a file or `-` for stdin")
                .arg(
                    Arg::new("kind")
                        .required(true)
                        .value_parser(["notebook", "note", "note-update", "collection"]),
                )
                .arg(Arg::new("file").required(true)),
        )
        .subcommand(
            Command::new("template")
                .about("Print a JSON import template")
                .arg(
                    Arg::new("kind")
                        .required(true)
                        .value_parser(["notebook", "note"]),
                )
                .arg(Arg::new("notebook").long("notebook").help("Notebook id")),
        )
}

fn run(matches: &ArgMatches) -> Result<(), String> {
    if let Some(log_dir) = matches.get_one::<PathBuf>("log-dir") {
        let level = matches
            .get_one::<String>("log-level")
            .map(String::as_str)
            .unwrap_or_else(|| default_log_level());
        init_logging(level, &log_dir.to_string_lossy())?;
    }

    let db_path = matches
        .get_one::<PathBuf>("db")
        .cloned()
        .unwrap_or_else(resolve_db_path);
    let storage = SqliteLocalStorage::open(&db_path)
        .map_err(|err| format!("cannot open `{}`: {err}", db_path.display()))?;
    let mut store = NotebookStore::open(storage).map_err(|err| err.to_string())?;
    info!(
        "event=cli_start module=cli status=ok db_path={}",
        db_path.display()
    );

    let Some((name, args)) = matches.subcommand() else {
        return Ok(());
    };
    execute(&mut store, name, args)?;

    for notification in store.take_notifications() {
        eprintln!("{}", notification.message);
    }
    Ok(())
}

fn execute(store: &mut Store, name: &str, args: &ArgMatches) -> Result<(), String> {
    match name {
        "notebooks" => {
            for notebook in store.notebooks() {
                println!(
                    "{}\t{}\t{} note(s)\t{}",
                    notebook.id,
                    notebook.title,
                    notebook.notes.len(),
                    notebook.description.as_deref().unwrap_or("")
                );
            }
        }
        "notes" => {
            let notebook_id = text(args, "notebook")?;
            let notebook = store
                .notebook(notebook_id)
                .ok_or_else(|| format!("notebook `{notebook_id}` not found"))?;
            for note in &notebook.notes {
                println!("{}\t{}\t{} line(s)", note.id, note.title, note.lines.len());
            }
        }
        "show" => {
            let note_id = text(args, "note")?;
            let mode = if args.get_flag("detail") {
                ViewMode::Detail
            } else {
                ViewMode::Inline
            };
            let note = store
                .find_note(note_id)
                .ok_or_else(|| format!("note `{note_id}` not found"))?;
            print!("{}", render_note(note, mode));
            let linked: Vec<&str> = store
                .linked_notes(note_id)
                .into_iter()
                .map(|note| note.title.as_str())
                .collect();
            if !linked.is_empty() {
                println!("\nLinked: {}", linked.join(", "));
            }
        }
        "new-notebook" => {
            let title = non_blank(text(args, "title")?, "title")?;
            let description = args
                .get_one::<String>("description")
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty());
            let id = store
                .create_notebook(title, description)
                .map_err(|err| err.to_string())?;
            println!("{id}");
        }
        "new-note" => {
            let notebook_id = text(args, "notebook")?;
            let title = non_blank(text(args, "title")?, "title")?;
            let id = store
                .create_note(notebook_id, title)
                .map_err(|err| err.to_string())?
                .ok_or_else(|| format!("notebook `{notebook_id}` not found"))?;
            println!("{id}");
        }
        "rename-note" => {
            let renamed = store
                .rename_note(text(args, "note")?, text(args, "title")?)
                .map_err(|err| err.to_string())?;
            applied(renamed, "note not found or title unchanged")?;
        }
        "delete-note" => {
            let deleted = store
                .delete_note(text(args, "note")?)
                .map_err(|err| err.to_string())?;
            applied(deleted, "note not found")?;
        }
        "add-line" => {
            let note_id = text(args, "note")?;
            let id = store
                .add_line_to_note(note_id, text(args, "text")?)
                .map_err(|err| err.to_string())?
                .ok_or_else(|| format!("note `{note_id}` not found"))?;
            println!("{id}");
        }
        "edit-line" => {
            let updated = store
                .update_line(text(args, "note")?, text(args, "line")?, text(args, "text")?)
                .map_err(|err| err.to_string())?;
            applied(updated, "line not found")?;
        }
        "delete-line" => {
            let deleted = store
                .delete_line(text(args, "note")?, text(args, "line")?)
                .map_err(|err| err.to_string())?;
            applied(deleted, "line not found")?;
        }
        "add-link" => attach(store, args, content_forms::link(text(args, "url")?))?,
        "add-markdown" => attach(store, args, content_forms::markdown(text(args, "source")?))?,
        "add-checklist" => attach(
            store,
            args,
            content_forms::checklist_from_json(text(args, "json")?),
        )?,
        "add-table" => attach(
            store,
            args,
            content_forms::table_from_json(text(args, "json")?),
        )?,
        "attach" => {
            let path = args
                .get_one::<PathBuf>("path")
                .ok_or("missing argument `path`")?;
            let bytes = std::fs::read(path)
                .map_err(|err| format!("cannot read `{}`: {err}", path.display()))?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mime_type = args
                .get_one::<String>("mime")
                .cloned()
                .unwrap_or_else(|| guess_mime_type(path).to_string());
            attach(
                store,
                args,
                content_forms::upload(&filename, &mime_type, &bytes),
            )?;
        }
        "check" => {
            let path = item_path(args)?;
            let toggled = store
                .toggle_checklist_item(
                    text(args, "note")?,
                    text(args, "line")?,
                    &path,
                    !args.get_flag("uncheck"),
                )
                .map_err(|err| err.to_string())?;
            applied(toggled, "checklist item not found or unchanged")?;
        }
        "edit-item" => {
            let path = item_path(args)?;
            let (note_id, line_id) = (text(args, "note")?, text(args, "line")?);
            let mut item = store
                .checklist_item(note_id, line_id, &path)
                .cloned()
                .ok_or("checklist item not found")?;
            item.text = non_blank(text(args, "text")?, "text")?.to_string();
            let updated = store
                .update_checklist_item(note_id, line_id, &path, item)
                .map_err(|err| err.to_string())?;
            applied(updated, "checklist item not found")?;
        }
        "edit-table" => {
            let edit = table_edit(args)?;
            let updated = store
                .update_table(text(args, "note")?, text(args, "line")?, edit)
                .map_err(|err| err.to_string())?;
            applied(updated, "no table on that line or index out of range")?;
        }
        "draw" => {
            let mut canvas = DrawingCanvas::new();
            if let Some(color) = args.get_one::<String>("color") {
                canvas.set_color(color).map_err(|err| err.to_string())?;
            }
            if let Some(size) = args.get_one::<u32>("brush") {
                canvas.set_brush_size(*size);
            }
            for stroke in args.get_many::<String>("stroke").into_iter().flatten() {
                draw_stroke(&mut canvas, stroke)?;
            }
            let data_url = canvas.take_export().ok_or("nothing was drawn")?;
            attach(store, args, content_forms::drawing(&data_url))?;
        }
        "link" => {
            let linked = store
                .link_notes(text(args, "source")?, text(args, "target")?)
                .map_err(|err| err.to_string())?;
            applied(linked, "notes already linked or not found")?;
        }
        "unlink" => {
            let unlinked = store
                .unlink_notes(text(args, "source")?, text(args, "target")?)
                .map_err(|err| err.to_string())?;
            applied(unlinked, "notes were not linked")?;
        }
        "export" => {
            let json = json_io::export_notebooks(store.notebooks()).map_err(|err| err.to_string())?;
            match args.get_one::<PathBuf>("out") {
                Some(out) => std::fs::write(out, json)
                    .map_err(|err| format!("cannot write `{}`: {err}", out.display()))?,
                None => println!("{json}"),
            }
        }
        "import" => {
            let json = read_input(text(args, "file")?)?;
            let imported = match text(args, "kind")? {
                "notebook" => json_io::import_notebook(store, &json),
                "note" => json_io::import_note(store, &json),
                "note-update" => json_io::import_note_update(store, &json),
                _ => json_io::import_collection(store, &json)
                    .map(|count| format!("{count} notebook(s)")),
            }
            .map_err(|err| err.to_string())?;
            println!("{imported}");
        }
        "template" => {
            let template = match text(args, "kind")? {
                "note" => json_io::note_template(
                    args.get_one::<String>("notebook")
                        .map(String::as_str)
                        .or_else(|| store.current_notebook().map(|notebook| notebook.id.as_str())),
                ),
                _ => json_io::notebook_template(),
            };
            println!("{template}");
        }
        other => return Err(format!("unknown command `{other}`")),
    }
    Ok(())
}

fn attach<E: std::fmt::Display>(
    store: &mut Store,
    args: &ArgMatches,
    content: Result<ContentItem, E>,
) -> Result<(), String> {
    let content = content.map_err(|err| err.to_string())?;
    let added = store
        .add_content_to_line(text(args, "note")?, text(args, "line")?, content)
        .map_err(|err| err.to_string())?;
    applied(added, "line not found")
}

fn item_path(args: &ArgMatches) -> Result<ChecklistPath, String> {
    let item_id = text(args, "item")?.to_string();
    Ok(match args.get_one::<String>("parent") {
        Some(parent_id) => ChecklistPath::nested(parent_id.clone(), item_id),
        None => ChecklistPath::top_level(item_id),
    })
}

fn table_edit(args: &ArgMatches) -> Result<TableEdit, String> {
    let index = |name: &str| {
        args.get_one::<usize>(name)
            .copied()
            .ok_or_else(|| format!("`--{name}` is required for this action"))
    };
    let value = || {
        args.get_one::<String>("value")
            .cloned()
            .ok_or_else(|| "`--value` is required for this action".to_string())
    };
    let edit = match text(args, "action")? {
        "add-column" => TableEdit::AddColumn {
            header: args.get_one::<String>("value").cloned().unwrap_or_default(),
        },
        "remove-column" => TableEdit::RemoveColumn {
            index: index("index")?,
        },
        "add-row" => TableEdit::AddRow,
        "remove-row" => TableEdit::RemoveRow {
            index: index("index")?,
        },
        "set-header" => TableEdit::SetHeader {
            index: index("index")?,
            value: value()?,
        },
        "set-cell" => TableEdit::SetCell {
            row: index("row")?,
            column: index("column")?,
            value: value()?,
        },
        other => return Err(format!("unknown table action `{other}`")),
    };
    Ok(edit)
}

/// Replays one `x,y;x,y;...` stroke onto the canvas.
fn draw_stroke(canvas: &mut DrawingCanvas, stroke: &str) -> Result<(), String> {
    let points = stroke
        .split(';')
        .filter(|point| !point.trim().is_empty())
        .map(parse_point)
        .collect::<Result<Vec<_>, _>>()?;
    let Some(((x, y), rest)) = points.split_first() else {
        return Err(format!("stroke `{stroke}` has no points"));
    };
    canvas.pointer_down(*x, *y);
    for (x, y) in rest {
        canvas.pointer_move(*x, *y);
    }
    if rest.is_empty() {
        canvas.pointer_move(*x, *y);
    }
    canvas.pointer_up().map_err(|err| err.to_string())
}

fn parse_point(point: &str) -> Result<(f32, f32), String> {
    let invalid = || format!("invalid point `{point}`; expected x,y");
    let (x, y) = point.trim().split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<f32>().map_err(|_| invalid())?;
    let y = y.trim().parse::<f32>().map_err(|_| invalid())?;
    Ok((x, y))
}

fn applied(changed: bool, reason: &str) -> Result<(), String> {
    if changed {
        Ok(())
    } else {
        Err(format!("nothing changed: {reason}"))
    }
}

fn text<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str, String> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument `{name}`"))
}

fn non_blank<'a>(value: &'a str, name: &str) -> Result<&'a str, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{name} must not be blank"));
    }
    Ok(trimmed)
}

fn read_input(source: &str) -> Result<String, String> {
    if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|err| format!("cannot read stdin: {err}"))?;
        return Ok(buffer);
    }
    std::fs::read_to_string(source).map_err(|err| format!("cannot read `{source}`: {err}"))
}

fn guess_mime_type(path: &Path) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
}

#[cfg(test)]
mod tests {
    use super::{cli, draw_stroke, guess_mime_type, non_blank, parse_point, table_edit};
    use std::path::Path;
    use thoughtcanvas_core::{DrawingCanvas, TableEdit};

    #[test]
    fn command_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn global_db_flag_parses_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["thoughtcanvas", "notes", "notebook-1", "--db", "/tmp/x.db"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "notes");
        assert_eq!(
            args.get_one::<String>("notebook").map(String::as_str),
            Some("notebook-1")
        );
    }

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(guess_mime_type(Path::new("a/photo.JPG")), "image/jpeg");
        assert_eq!(guess_mime_type(Path::new("scan.bmp")), "image/bmp");
        assert_eq!(guess_mime_type(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn table_actions_map_to_edits() {
        let matches = cli()
            .try_get_matches_from([
                "thoughtcanvas",
                "edit-table",
                "note-1",
                "line-1",
                "set-cell",
                "--row",
                "0",
                "--column",
                "1",
                "--value",
                "42",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(
            table_edit(args).unwrap(),
            TableEdit::SetCell {
                row: 0,
                column: 1,
                value: "42".to_string()
            }
        );

        let matches = cli()
            .try_get_matches_from(["thoughtcanvas", "edit-table", "n", "l", "remove-row"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert!(table_edit(args).unwrap_err().contains("--index"));
    }

    #[test]
    fn strokes_are_replayed_onto_canvas() {
        let mut canvas = DrawingCanvas::new();
        draw_stroke(&mut canvas, "10,10; 60,10").unwrap();
        assert_eq!(canvas.pixel(30, 10), Some([0, 0, 0, 255]));
        assert!(canvas.pending_export().is_some());

        assert!(draw_stroke(&mut canvas, ";").is_err());
        assert!(parse_point("1;2").is_err());
        assert_eq!(parse_point(" 3.5 , 4 ").unwrap(), (3.5, 4.0));
    }

    #[test]
    fn blank_titles_are_rejected() {
        assert!(non_blank("  ", "title").is_err());
        assert_eq!(non_blank(" Work ", "title").unwrap(), "Work");
    }
}
