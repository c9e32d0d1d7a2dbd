use std::time::Duration;

use anyhow::Error;
use clap::{App, Arg, ArgMatches};
use colorful::Color;
use colorful::Colorful;
use formats::select_format;
use twit::{Extractor, ExtractorConfig, MediaRecord};

mod formats;
mod page;
mod twit;

fn is_number(test: String) -> Result<(), String> {
    test.parse::<u64>().map_err(|err| err.to_string())?;
    Ok(())
}

fn done(log: &str) {
    println!("{} {}", "[+]".color(Color::Green), log.color(Color::Green))
}

fn fail(log: &str) {
    eprintln!("{} {}", "[!]".color(Color::Red), log.color(Color::Red))
}

fn pending(log: &str) {
    println!(
        "{} {}",
        "[-]".color(Color::Yellow),
        log.color(Color::Yellow)
    )
}

#[tokio::main]
pub async fn main() -> Result<(), Error> {
    let matches = App::new("twit-dl")
        .version(clap::crate_version!())
        .author(clap::crate_authors!())
        .about(clap::crate_description!())
        .arg(
            Arg::with_name("url")
                .required(true)
                .index(1)
                .value_name("URL")
                .help("Episode page, i.e. https://twit.tv/shows/security-now/episodes/500."),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .short("j")
                .conflicts_with("format")
                .help("Prints the extracted episode as JSON."),
        )
        .arg(
            Arg::with_name("format")
                .long("format")
                .short("f")
                .takes_value(true)
                .value_name("FORMAT")
                .help("Prints only the URL of the given format id, or of \"best\" / \"worst\"."),
        )
        .arg(
            Arg::with_name("timeout")
                .long("timeout")
                .takes_value(true)
                .default_value("30000")
                .value_name("TIMEOUT")
                .validator(is_number)
                .help("The page request timeout in milliseconds."),
        )
        .arg(
            Arg::with_name("host")
                .long("host")
                .takes_value(true)
                .value_name("HOST")
                .help("Accepts episode URLs on another host (twit.tv by default)."),
        )
        .arg(
            Arg::with_name("user_agent")
                .long("user-agent")
                .takes_value(true)
                .value_name("USER_AGENT")
                .help("User-Agent header sent with the page request."),
        )
        .arg(
            Arg::with_name("quiet")
                .long("quiet")
                .short("q")
                .help("Only prints the result."),
        )
        .get_matches();

    let quiet = matches.is_present("quiet")
        || matches.is_present("json")
        || matches.is_present("format");
    let url = matches.value_of("url").unwrap_or_default();
    let extractor = Extractor::new(config_from(&matches)?)?;
    if !quiet {
        pending(format!("Fetching {}...", url).as_str());
    }
    let record = extractor.extract(url).await?;
    if !quiet {
        done(format!("Found episode \"{}\".", record.title).as_str());
    }

    if matches.is_present("json") {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else if let Some(selector) = matches.value_of("format") {
        println!("{}", select_format(&record.formats, selector)?.url);
    } else {
        print_record(&record);
    }
    Ok(())
}

fn config_from(matches: &ArgMatches) -> Result<ExtractorConfig, Error> {
    let mut config = ExtractorConfig::default();
    if let Some(timeout) = matches.value_of("timeout") {
        config = config.with_timeout(Duration::from_millis(timeout.parse()?));
    }
    if let Some(host) = matches.value_of("host") {
        config = config.with_host(host);
    }
    if let Some(user_agent) = matches.value_of("user_agent") {
        config = config.with_user_agent(user_agent);
    }
    Ok(config)
}

fn print_record(record: &MediaRecord) {
    println!("id:          {}", record.id.as_deref().unwrap_or("-"));
    println!("display id:  {}", record.display_id);
    println!("title:       {}", record.title);
    if let Some(upload_date) = &record.upload_date {
        println!("aired:       {}", upload_date);
    }
    if let Some(duration) = record.duration {
        println!(
            "duration:    {}:{:02}:{:02}",
            duration / 3600,
            duration % 3600 / 60,
            duration % 60
        );
    }
    if let Some(thumbnail) = &record.thumbnail {
        println!("thumbnail:   {}", thumbnail);
    }
    if let Some(description) = &record.description {
        println!("description: {}", description);
    }
    if record.formats.is_empty() {
        fail("No downloadable formats listed.");
        return;
    }
    println!();
    println!("{:<16} {:<12} {:>8}  {}", "format", "resolution", "kbps", "url");
    for format in &record.formats {
        println!(
            "{:<16} {:<12} {:>8}  {}",
            format.format_id,
            format.resolution().unwrap_or_else(|| "unknown".to_string()),
            format
                .tbr
                .map(|tbr| tbr.to_string())
                .unwrap_or_else(|| "-".to_string()),
            format.url
        );
    }
}
