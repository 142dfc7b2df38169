use clap::Parser;
use docseek::{
    Annotation,
    DataDir,
    DocumentBody,
    DocumentDb,
    DocumentSource,
    SearchConfig,
    config::{RAW_AFTER, RAW_BEFORE, STRUCTURED_AFTER, STRUCTURED_BEFORE},
    error::{self, Error},
    ingestion,
    search,
};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{AnnotationAction, Cli, Command, ConfigAction, DocAction};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("DOCSEEK_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    let db = DocumentDb::open(&data_dir.documents_db())?;

    match cli.command {
        Command::Doc { action } => match action {
            DocAction::Import { path, title } => {
                let id = ingestion::import_file(&db, &path, title.as_deref())?;
                println!("Imported document #{id}");
            }
            DocAction::List { json } => doc_list(&db, json)?,
            DocAction::Show { id, json } => doc_show(&db, id, json)?,
            DocAction::Rename { id, title } => {
                db.set_title(id, &title)?;
                println!("Renamed document #{id}");
            }
            DocAction::Edit { id, path } => {
                let body = ingestion::read_body(&path)?;
                let pages = body.page_count();
                db.replace_body(id, body)?;
                println!("Replaced document #{id} with {pages} page(s)");
            }
            DocAction::SetPage {
                id,
                page,
                text,
                translation,
            } => {
                if text.is_none() && translation.is_none() {
                    return Err(Error::InvalidArgument(
                        "nothing to change: pass --text or --translation"
                            .into(),
                    ));
                }
                if let Some(text) = text {
                    db.set_page_text(id, page, Some(text))?;
                }
                if let Some(translation) = translation {
                    db.set_page_translation(id, page, Some(translation))?;
                }
                println!("Updated page {page} of document #{id}");
            }
            DocAction::Remove { id } => {
                if !db.remove_document(id)? {
                    return Err(Error::NotFound {
                        kind: "document",
                        name: id.to_string(),
                    });
                }
                println!("Removed document #{id}");
            }
        },
        Command::Annotation { action } => match action {
            AnnotationAction::Add { doc, page, fields } => {
                let position =
                    db.add_annotation(doc, page, Annotation::from(fields))?;
                println!("Added annotation #{position} to page {page}");
            }
            AnnotationAction::Update {
                doc,
                page,
                position,
                fields,
            } => {
                db.update_annotation(
                    doc,
                    page,
                    position,
                    Annotation::from(fields),
                )?;
                println!("Updated annotation #{position} on page {page}");
            }
            AnnotationAction::Remove {
                doc,
                page,
                position,
            } => {
                db.remove_annotation(doc, page, position)?;
                println!("Removed annotation #{position} from page {page}");
            }
            AnnotationAction::List { doc, page, json } => {
                annotation_list(&db, doc, page, json)?;
            }
        },
        Command::Search(args) => {
            let mut config = SearchConfig::load(&db)?;
            let overrides = [
                (STRUCTURED_BEFORE, args.before),
                (STRUCTURED_AFTER, args.after),
                (RAW_BEFORE, args.raw_before),
                (RAW_AFTER, args.raw_after),
            ];
            for (key, value) in overrides {
                if let Some(value) = value {
                    config.set(key, value)?;
                }
            }

            let results = search::search(&db, &args.keyword, &config)?;

            if args.json {
                search::format_json(&results)?;
            } else {
                search::format_human(&results);
            }
        }
        Command::Config { action } => match action {
            ConfigAction::Show { json } => {
                let config = SearchConfig::load(&db)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                } else {
                    for (key, value) in config.entries() {
                        println!("{key}\t{value}");
                    }
                }
            }
            ConfigAction::Set { key, value } => {
                let mut config = SearchConfig::load(&db)?;
                config.set(&key, value)?;
                config.store(&db)?;
                println!("Set {key} = {value}");
            }
        },
        Command::Status(args) => {
            cmd_status(&db, &data_dir, args.json)?;
        }
        Command::Completions(args) => args.generate(),
    }

    Ok(())
}

fn doc_list(db: &DocumentDb, json: bool) -> error::Result<()> {
    let documents = db.list_documents()?;

    if json {
        let summaries: Vec<serde_json::Value> = documents
            .iter()
            .map(|doc| {
                let layout = if doc.body.is_raw() { "raw" } else { "paged" };
                serde_json::json!({
                    "id": doc.id,
                    "title": doc.title,
                    "type": doc.doc_type.code(),
                    "pages": doc.body.page_count(),
                    "layout": layout,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else if documents.is_empty() {
        println!("No documents stored.");
    } else {
        for doc in &documents {
            println!(
                "#{}\t{}\t{}\t{} page(s)",
                doc.id,
                doc.doc_type,
                doc.title.as_deref().unwrap_or("<untitled>"),
                doc.body.page_count()
            );
        }
    }
    Ok(())
}

fn doc_show(db: &DocumentDb, id: u64, json: bool) -> error::Result<()> {
    let doc = db.get_document(id)?.ok_or_else(|| Error::NotFound {
        kind: "document",
        name: id.to_string(),
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("#{} {}", doc.id, doc.title.as_deref().unwrap_or("<untitled>"));
    println!("type: {}", doc.doc_type);
    match &doc.body {
        DocumentBody::Paged { pages } => {
            for (idx, page) in pages.iter().enumerate() {
                println!("--- page {} ---", idx + 1);
                if let Some(text) = &page.text {
                    println!("{text}");
                }
                if let Some(translation) = &page.jp_translation {
                    println!("[translation] {translation}");
                }
                for (pos, annotation) in page.annotations.iter().enumerate() {
                    println!("[#{}] {}", pos + 1, describe(annotation));
                }
            }
        }
        DocumentBody::Raw { text } => {
            for (idx, blob) in text.iter().enumerate() {
                println!("--- page {} ---", idx + 1);
                if let Some(blob) = blob {
                    println!("{blob}");
                }
            }
        }
    }
    Ok(())
}

fn annotation_list(
    db: &DocumentDb,
    doc_id: u64,
    page_number: usize,
    json: bool,
) -> error::Result<()> {
    let mut doc = db.get_document(doc_id)?.ok_or_else(|| Error::NotFound {
        kind: "document",
        name: doc_id.to_string(),
    })?;
    let page = doc.page_mut(page_number)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page.annotations)?);
    } else if page.annotations.is_empty() {
        println!("No annotations on page {page_number}.");
    } else {
        for (pos, annotation) in page.annotations.iter().enumerate() {
            println!("#{}\t{}", pos + 1, describe(annotation));
        }
    }
    Ok(())
}

fn describe(annotation: &Annotation) -> String {
    format!(
        "{} ({}): {}",
        annotation.target_text.as_deref().unwrap_or("-"),
        annotation.kind.as_deref().unwrap_or("-"),
        annotation.content.as_deref().unwrap_or("")
    )
}

fn cmd_status(
    db: &DocumentDb,
    data_dir: &DataDir,
    json: bool,
) -> error::Result<()> {
    let doc_count = db.list_document_ids()?.len();
    let config = SearchConfig::load(db)?;

    if json {
        let status = serde_json::json!({
            "data_dir": data_dir.root().display().to_string(),
            "documents": doc_count,
            "windows": config,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("Data directory: {}", data_dir.root().display());
        println!("Documents: {doc_count}");
        println!(
            "Structured window: {} before / {} after",
            config.structured.before, config.structured.after
        );
        println!(
            "Raw window: {} before / {} after",
            config.raw.before, config.raw.after
        );
    }
    Ok(())
}
