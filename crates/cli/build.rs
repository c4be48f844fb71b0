use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("pagesense")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Pagesense Contributors")
        .about("Analyze the settled content of a web page")
        .arg(clap::arg!(<INPUT> "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (text, json)")
                .value_name("FORMAT")
                .default_value("text")
                .value_parser(["text", "json"]),
        )
        .arg(clap::arg!(--links "List every link in text output"))
        .arg(clap::arg!(--sections "Print section text under each heading in text output"))
        .arg(clap::arg!(--debounce_ms <MS> "Quiet period before the page counts as stable").default_value("800"))
        .arg(clap::arg!(--kill_switch_ms <MS> "Hard limit on watching, in milliseconds").default_value("5000"))
        .arg(clap::arg!(--semantic "Embed the page and select its thesis sentence"))
        .arg(
            clap::arg!(--threshold <SCORE> "Similarity a sentence must exceed to be chosen over the fallback")
                .default_value("0.65"),
        )
        .arg(clap::arg!(--embed_endpoint <URL> "OpenAI-compatible embeddings API root").value_name("URL"))
        .arg(
            clap::arg!(--embed_model <MODEL> "Embedding model name for the remote endpoint")
                .default_value("text-embedding-3-small"),
        )
        .arg(clap::arg!(--embed_dimensions <NUM> "Requested embedding dimensions for the remote endpoint"))
        .arg(clap::arg!(--api_key <KEY> "API key for the remote endpoint").value_name("KEY"))
        .arg(clap::arg!(--include_vector "Include the document vector in JSON output"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--user_agent <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "pagesense", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "pagesense", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "pagesense", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "pagesense", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
