//! Word list admin tool
//!
//! Command-line front end for the word-list service: list and filter
//! dictionaries, page through and search words, manage dictionaries and
//! their word lists, and run an interactive browse session.
//!
//! # Usage
//!
//! ```bash
//! # Filter the dictionary list
//! wordlist-admin dictionaries --filter cet
//!
//! # Page 2 of a dictionary, or a keyword search
//! wordlist-admin words --dictionary 3 --page 2
//! wordlist-admin words --keyword apple
//!
//! # Bulk-add a JSON word list (raw or gzip-compressed)
//! wordlist-admin add-words 3 words.json.gz
//!
//! # Interactive browsing
//! wordlist-admin browse
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{HumanBytes, HumanDuration, ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use wordlist_core::config::{API_BASE_ENV, API_TIMEOUT_ENV, DEFAULT_PAGE_SIZE};
use wordlist_core::import::{
    batches, format_json, parse_word_list, read_word_list_file, ImportStats,
};
use wordlist_core::models::DEFAULT_CATEGORY;
use wordlist_core::{
    ApiClient, BrowseConfig, BrowseEvent, BrowseSession, BrowseSnapshot, BrowseState,
    ClientConfig, CsvUpload, DictionaryFilter, Error, NewDictionary, PaginationController,
    WordListProcessResult, WordService,
};

/// Word list admin - browse and manage dictionaries on a word-list service
#[derive(Parser, Debug)]
#[command(name = "wordlist-admin")]
#[command(author, version, about = "Browse and manage dictionaries on a word-list service")]
#[command(long_about = "
Command-line front end for the word-list service.

The service base URL comes from --api-base, the WORDLIST_API_BASE environment
variable (a .env file is honoured), or defaults to http://localhost:8080/api/.

Example usage:
  wordlist-admin dictionaries --filter cet --page 2
  wordlist-admin words --keyword apple
  wordlist-admin import-csv 3 words.csv --no-header
")]
struct Args {
    /// Base URL of the word-list service API
    #[arg(long, global = true, env = "WORDLIST_API_BASE")]
    api_base: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List dictionaries, filtered by name
    Dictionaries {
        /// Case-insensitive name filter
        #[arg(short, long, default_value = "")]
        filter: String,

        /// Page of the filtered list
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Page through a dictionary or search all words
    Words {
        /// Dictionary to browse
        #[arg(short, long, conflicts_with = "keyword")]
        dictionary: Option<i64>,

        /// Search keyword
        #[arg(short, long)]
        keyword: Option<String>,

        /// Page to show (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Words per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
        page_size: u32,
    },

    /// Show the full entry of one word
    Show {
        /// Word id
        id: i64,
    },

    /// Create a user dictionary
    Create {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = DEFAULT_CATEGORY)]
        category: String,

        #[arg(long)]
        file_path: Option<String>,

        #[arg(long)]
        file_size: Option<u64>,

        #[arg(long)]
        word_count: Option<u64>,
    },

    /// Delete a user dictionary
    Delete {
        /// Dictionary id
        id: i64,
    },

    /// Bulk-add words from a JSON word list (.json or .json.gz)
    AddWords {
        /// Target dictionary id
        dictionary_id: i64,

        /// Word list file
        file: PathBuf,

        /// Quiet mode - suppress progress bar
        #[arg(short, long, default_value = "false")]
        quiet: bool,
    },

    /// Validate a JSON word list the way a single bulk-add request would
    Check {
        /// Word list file (.json)
        file: PathBuf,

        /// Print the list pretty-printed when it is valid
        #[arg(long, default_value = "false")]
        pretty: bool,
    },

    /// Upload a CSV file of words
    ImportCsv {
        /// Target dictionary id
        dictionary_id: i64,

        /// CSV file
        file: PathBuf,

        /// The first row is data, not a header
        #[arg(long, default_value = "false")]
        no_header: bool,
    },

    /// Interactive browse session reading commands from stdin
    Browse {
        /// Dictionary to open first
        #[arg(short, long)]
        dictionary: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let client = build_client(&args)?;
    log::debug!("Using API base {}", client.base_url());

    match args.command {
        Command::Dictionaries { filter, page } => list_dictionaries(&client, &filter, page).await,
        Command::Words {
            dictionary,
            keyword,
            page,
            page_size,
        } => list_words(&client, dictionary, keyword, page, page_size).await,
        Command::Show { id } => show_word(&client, id).await,
        Command::Create {
            name,
            category,
            file_path,
            file_size,
            word_count,
        } => {
            let dictionary = NewDictionary {
                category,
                file_path: file_path.unwrap_or_default(),
                file_size: file_size.unwrap_or_default(),
                word_count: word_count.unwrap_or_default(),
                ..NewDictionary::new(name)
            };
            create_dictionary(&client, &dictionary).await
        }
        Command::Delete { id } => delete_dictionary(&client, id).await,
        Command::AddWords {
            dictionary_id,
            file,
            quiet,
        } => add_words(&client, dictionary_id, &file, quiet).await,
        Command::Check { file, pretty } => check_word_list(&file, pretty),
        Command::ImportCsv {
            dictionary_id,
            file,
            no_header,
        } => import_csv(&client, dictionary_id, &file, !no_header).await,
        Command::Browse { dictionary } => browse(client, dictionary).await,
    }
}

fn build_client(args: &Args) -> Result<ApiClient> {
    let config = client_config(args.api_base.as_deref(), args.timeout, |name| {
        std::env::var(name).ok()
    })?;
    Ok(ApiClient::new(&config)?)
}

/// Command-line flags take precedence over the environment; an overridden
/// setting is never read from `env`
fn client_config(
    api_base: Option<&str>,
    timeout: Option<u64>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig> {
    ClientConfig::from_lookup(|name| match name {
        API_BASE_ENV if api_base.is_some() => api_base.map(str::to_string),
        API_TIMEOUT_ENV if timeout.is_some() => timeout.map(|secs| secs.to_string()),
        _ => env(name),
    })
    .context("Invalid client configuration")
}

fn dictionary_filter(search_text: &str, page: u32) -> DictionaryFilter {
    let mut filter = DictionaryFilter::new(BrowseConfig::default().dictionary_page_size);
    filter.set_search_text(search_text);
    filter.set_page(page);
    filter
}

async fn list_dictionaries(client: &ApiClient, filter_text: &str, page: u32) -> Result<()> {
    let dictionaries = client
        .list_dictionaries()
        .await
        .context("Failed to load dictionaries")?;

    let window = dictionary_filter(filter_text, page).apply(&dictionaries);

    if window.items.is_empty() {
        println!("No dictionaries match {:?}", filter_text);
        return Ok(());
    }

    println!(
        "{:>6}  {:<28} {:<12} {:>10} {:>10}  {}",
        "ID", "Name", "Category", "Words", "Size", "Type"
    );
    for d in &window.items {
        println!(
            "{:>6}  {:<28} {:<12} {:>10} {:>10}  {}",
            d.id,
            d.name,
            d.category.as_deref().unwrap_or("-"),
            format_number(d.word_count.unwrap_or_default()),
            format_file_size(d.file_size.unwrap_or_default()),
            if d.is_user_created() { "user" } else { "imported" }
        );
    }
    println!();
    println!(
        "Page {}/{} ({} matching)",
        window.page, window.total_pages, window.total_matches
    );

    Ok(())
}

async fn list_words(
    client: &ApiClient,
    dictionary: Option<i64>,
    keyword: Option<String>,
    page: u32,
    page_size: u32,
) -> Result<()> {
    let mut controller = PaginationController::new(page_size);

    let ticket = match (dictionary, keyword.as_deref()) {
        (Some(id), _) => controller.select_dictionary(id),
        (None, Some(keyword)) if !keyword.trim().is_empty() => controller.set_keyword(keyword),
        _ => bail!("Pass --dictionary ID or a non-empty --keyword"),
    };
    controller.drive(client, ticket).await;

    if page > 1 && controller.last_error().is_none() {
        let ticket = controller.go_to_page(page)?;
        controller.drive(client, ticket).await;
    }

    if let Some(err) = controller.last_error() {
        bail!("Failed to load words: {}", err);
    }

    print_words(&controller.state(), &controller.result().items);
    println!();
    println!(
        "Page {}/{} ({} words)",
        controller.page(),
        controller.total_pages(),
        format_number(controller.result().total_count)
    );

    Ok(())
}

async fn show_word(client: &ApiClient, id: i64) -> Result<()> {
    let word = client
        .get_word(id)
        .await
        .with_context(|| format!("Failed to load word {}", id))?;

    println!("{}", word.word);
    if let Some(phonetic) = &word.phonetic {
        println!("  Phonetic:       {}", phonetic);
    }
    if let Some(pos) = &word.part_of_speech {
        println!("  Part of speech: {}", pos);
    }
    if let Some(definition) = &word.definition {
        println!("  Definition:     {}", definition);
    }
    if let Some(translation) = &word.translation {
        println!("  Translation:    {}", translation);
    }
    if let Some(example) = &word.example_sentence {
        println!("  Example:        {}", example);
    }
    if let Some(label) = word.difficulty_label() {
        println!("  Difficulty:     {}", label);
    }

    Ok(())
}

async fn create_dictionary(client: &ApiClient, dictionary: &NewDictionary) -> Result<()> {
    dictionary.validate()?;
    let created = client
        .create_dictionary(dictionary)
        .await
        .context("Failed to create dictionary")?;

    println!("Created dictionary {} ({})", created.id, created.name);
    Ok(())
}

async fn delete_dictionary(client: &ApiClient, id: i64) -> Result<()> {
    match client.delete_dictionary(id).await {
        Ok(()) => {
            println!("Deleted dictionary {}", id);
            Ok(())
        }
        Err(Error::Api {
            status: 400,
            message,
        }) => bail!("Dictionary {} cannot be deleted: {}", id, message),
        Err(e) => Err(e).with_context(|| format!("Failed to delete dictionary {}", id)),
    }
}

async fn add_words(client: &ApiClient, dictionary_id: i64, file: &Path, quiet: bool) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {:?}", file);
    }

    let input_size = std::fs::metadata(file).map(|m| m.len()).unwrap_or(0);
    println!("Input:      {:?} ({})", file, HumanBytes(input_size));
    println!("Dictionary: {}", dictionary_id);
    println!();

    let entries = read_word_list_file(file).context("Failed to read word list")?;
    log::info!("Adding {} words to dictionary {}", entries.len(), dictionary_id);

    let start_time = Instant::now();

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(entries.len() as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} words ({eta})")?
            .progress_chars("#>-"),
    );

    let mut stats = ImportStats::default();
    for batch in batches(&entries) {
        let outcome = client.bulk_add_words(dictionary_id, batch).await;
        if let Err(e) = &outcome {
            pb.println(format!("Batch {} failed: {}", stats.batches + 1, e));
        }
        stats.record(&outcome);
        pb.inc(batch.len() as u64);
    }

    pb.finish_and_clear();
    let elapsed = start_time.elapsed();

    println!("Import complete!");
    println!();
    print_process_result(&stats.result);
    println!("  Batches:            {:>12}", format_number(stats.batches));
    println!("  Failed batches:     {:>12}", format_number(stats.failed_batches));
    println!();
    println!("Performance:");
    println!("  Time elapsed:       {:>12}", HumanDuration(elapsed));

    if elapsed.as_secs() > 0 {
        let words_per_sec = entries.len() as u64 / elapsed.as_secs();
        println!("  Words/second:       {:>12}", format_number(words_per_sec));
    }

    log::info!(
        "Added {} of {} words to dictionary {} in {:?}",
        stats.result.added,
        entries.len(),
        dictionary_id,
        elapsed
    );

    if stats.failed_batches == stats.batches {
        bail!("Every batch was rejected by the service");
    }
    Ok(())
}

fn check_word_list(file: &Path, pretty: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {:?}", file))?;

    let entries = match parse_word_list(&text) {
        Ok(entries) => entries,
        Err(e) => bail!("Invalid word list: {}", e),
    };

    if pretty {
        println!("{}", format_json(&text)?);
    }
    println!(
        "{:?}: {} entries, ready for one bulk-add request",
        file,
        format_number(entries.len() as u64)
    );
    Ok(())
}

async fn import_csv(client: &ApiClient, dictionary_id: i64, file: &Path, has_header: bool) -> Result<()> {
    let upload = CsvUpload::from_path(file).context("CSV file rejected")?;
    println!("Input:      {} ({})", upload.file_name(), HumanBytes(upload.len() as u64));
    println!("Dictionary: {}", dictionary_id);
    println!();

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Uploading...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = client.import_csv(dictionary_id, &upload, has_header).await;
    spinner.finish_and_clear();
    let result = result.context("CSV import failed")?;

    println!("Import complete!");
    println!();
    print_process_result(&result);

    log::info!(
        "Imported {} into dictionary {}: {} added",
        upload.file_name(),
        dictionary_id,
        result.added
    );
    Ok(())
}

fn print_process_result(result: &WordListProcessResult) {
    println!("Statistics:");
    println!("  Total:              {:>12}", format_number(result.total));
    println!("  Already existed:    {:>12}", format_number(result.existed));
    println!("  Newly created:      {:>12}", format_number(result.created));
    println!("  Added:              {:>12}", format_number(result.added));
    println!("  Failed:             {:>12}", format_number(result.failed));
    if let Some(message) = &result.message {
        println!("  Message:            {}", message);
    }
}

fn print_words(state: &BrowseState, words: &[wordlist_core::MetaWord]) {
    match state {
        BrowseState::Idle => {
            println!("Select a dictionary (:dict ID) or type a keyword to search");
            return;
        }
        BrowseState::DictionaryBrowse { dictionary_id, .. } => {
            println!("Dictionary {}", dictionary_id);
        }
        BrowseState::Searching { keyword, .. } => {
            println!("Search results for {:?}", keyword);
        }
    }

    if words.is_empty() {
        println!("  (no words)");
    }
    for word in words {
        println!("{:>8}  {:<20} {}", word.id, word.word, word.preview(60));
    }
}

// ============================================================================
// Interactive browse
// ============================================================================

/// One line of interactive input
#[derive(Debug, PartialEq, Eq)]
enum BrowseInput {
    Event(BrowseEvent),
    Help,
    Quit,
}

const BROWSE_HELP: &str = "Type to search. Commands: :dict ID, :next, :prev, :page N, :clear, :help, :quit";

fn parse_browse_input(line: &str) -> std::result::Result<BrowseInput, String> {
    let Some(command) = line.trim().strip_prefix(':') else {
        return Ok(BrowseInput::Event(BrowseEvent::Keystroke(line.to_string())));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    let event = match (name, arg) {
        ("dict", Some(id)) => BrowseEvent::SelectDictionary(
            id.parse().map_err(|_| format!("Not a dictionary id: {}", id))?,
        ),
        ("page", Some(page)) => {
            BrowseEvent::GoToPage(page.parse().map_err(|_| format!("Not a page number: {}", page))?)
        }
        ("next", None) => BrowseEvent::NextPage,
        ("prev", None) => BrowseEvent::PrevPage,
        ("clear", None) => BrowseEvent::ClearSearch,
        ("help", None) => return Ok(BrowseInput::Help),
        ("quit" | "q", None) => return Ok(BrowseInput::Quit),
        _ => return Err(format!("Unknown command :{}", command)),
    };
    Ok(BrowseInput::Event(event))
}

fn render_snapshot(snapshot: &BrowseSnapshot) {
    if let Some(err) = &snapshot.last_error {
        eprintln!("Error: {}", err);
    }
    print_words(&snapshot.state, &snapshot.items);
    if snapshot.state != BrowseState::Idle {
        println!(
            "Page {}/{} ({} words){}{}",
            snapshot.page,
            snapshot.total_pages,
            format_number(snapshot.total_count),
            if snapshot.can_go_prev { "  :prev" } else { "" },
            if snapshot.can_go_next { "  :next" } else { "" },
        );
    }
    println!();
}

async fn browse(client: ApiClient, dictionary: Option<i64>) -> Result<()> {
    let service: Arc<dyn WordService> = Arc::new(client);
    let (events_tx, events_rx) = mpsc::channel(32);
    let (view_tx, mut view_rx) = watch::channel(BrowseSnapshot::default());

    let session = BrowseSession::new(service, &BrowseConfig::default());
    let session_task = tokio::spawn(session.run(events_rx, view_tx));

    // Render settled snapshots only; intermediate loading states are skipped
    let render_task = tokio::spawn(async move {
        let mut last_rendered: Option<BrowseSnapshot> = None;
        while view_rx.changed().await.is_ok() {
            let snapshot = view_rx.borrow_and_update().clone();
            if snapshot.loading || snapshot.searching {
                continue;
            }
            if last_rendered.as_ref() == Some(&snapshot) {
                continue;
            }
            render_snapshot(&snapshot);
            last_rendered = Some(snapshot);
        }
    });

    println!("{}", BROWSE_HELP);
    if let Some(id) = dictionary {
        events_tx
            .send(BrowseEvent::SelectDictionary(id))
            .await
            .context("Browse session ended")?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match parse_browse_input(&line) {
            Ok(BrowseInput::Event(event)) => {
                if events_tx.send(event).await.is_err() {
                    break;
                }
            }
            Ok(BrowseInput::Help) => println!("{}", BROWSE_HELP),
            Ok(BrowseInput::Quit) => break,
            Err(msg) => eprintln!("{}", msg),
        }
    }

    drop(events_tx);
    session_task.await.context("Browse session panicked")?;
    render_task.await.context("Renderer panicked")?;
    Ok(())
}

// ============================================================================
// Formatting
// ============================================================================

/// Format a number with thousand separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format a byte count as "12.3 KB", one decimal, capped at GB
fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_timeout_skips_malformed_env() {
        let env = |name: &str| match name {
            API_TIMEOUT_ENV => Some("abc".to_string()),
            _ => None,
        };
        let config = client_config(None, Some(30), env).unwrap();
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));

        assert!(client_config(None, None, env).is_err());
    }

    #[test]
    fn test_flag_base_overrides_env() {
        let env = |name: &str| match name {
            API_BASE_ENV => Some("not a url".to_string()),
            API_TIMEOUT_ENV => Some("5".to_string()),
            _ => None,
        };
        let config = client_config(Some("http://10.0.0.2:9000/api"), None, env).unwrap();
        assert_eq!(config.base_url.as_str(), "http://10.0.0.2:9000/api/");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let parsed = Args::try_parse_from(["wordlist-admin", "words", "-k", "app", "--page-size", "0"]);
        assert!(parsed.is_err());

        let parsed =
            Args::try_parse_from(["wordlist-admin", "words", "-k", "app", "--page-size", "25"]).unwrap();
        assert!(matches!(parsed.command, Command::Words { page_size: 25, .. }));
    }

    #[test]
    fn test_dictionary_filter_uses_browse_page_size() {
        let filter = dictionary_filter("cet", 2);
        assert_eq!(filter.page_size(), BrowseConfig::default().dictionary_page_size);
        assert_eq!(filter.search_text(), "cet");
        assert_eq!(filter.page(), 2);
    }

    #[test]
    fn test_check_word_list() {
        let dir = tempfile::tempdir().unwrap();
        let valid = dir.path().join("words.json");
        std::fs::write(&valid, r#"[{"word":"apple","difficulty":2}]"#).unwrap();
        assert!(check_word_list(&valid, true).is_ok());

        let invalid = dir.path().join("broken.json");
        std::fs::write(&invalid, r#"[{"word":"apple"},"#).unwrap();
        let err = check_word_list(&invalid, false).unwrap_err();
        assert!(err.to_string().contains("Invalid word list"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(500), "500.0 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10.0 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024 * 1024), "5120.0 GB");
    }

    #[test]
    fn test_parse_browse_commands() {
        assert_eq!(
            parse_browse_input(":dict 3"),
            Ok(BrowseInput::Event(BrowseEvent::SelectDictionary(3)))
        );
        assert_eq!(
            parse_browse_input(" :page 2 "),
            Ok(BrowseInput::Event(BrowseEvent::GoToPage(2)))
        );
        assert_eq!(
            parse_browse_input(":next"),
            Ok(BrowseInput::Event(BrowseEvent::NextPage))
        );
        assert_eq!(
            parse_browse_input(":clear"),
            Ok(BrowseInput::Event(BrowseEvent::ClearSearch))
        );
        assert_eq!(parse_browse_input(":quit"), Ok(BrowseInput::Quit));
        assert!(parse_browse_input(":dict abc").is_err());
        assert!(parse_browse_input(":next 2").is_err());
        assert!(parse_browse_input(":bogus").is_err());
    }

    #[test]
    fn test_plain_text_is_a_keystroke() {
        assert_eq!(
            parse_browse_input("apple"),
            Ok(BrowseInput::Event(BrowseEvent::Keystroke("apple".to_string())))
        );
        assert_eq!(
            parse_browse_input(""),
            Ok(BrowseInput::Event(BrowseEvent::Keystroke(String::new())))
        );
    }
}
