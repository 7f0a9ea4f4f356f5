//! `keyhints engines`: list the built-in completion engines.

use serde_json::json;

use keyhints_completion::builtin_engines;

pub(crate) fn run(json: bool) -> anyhow::Result<()> {
    let engines = builtin_engines();

    if json {
        let listing: Vec<_> = engines
            .iter()
            .map(|engine| {
                json!({
                    "name": engine.name,
                    "engine_url": engine.engine_url,
                    "format": engine.format,
                    "example": engine.example,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    for engine in engines.iter().filter(|e| !e.is_dummy()) {
        println!("{}", engine.name);
        if let Some(example) = &engine.example {
            println!("  {}: {}", example.keyword, example.search_url);
            if let Some(description) = &example.description {
                println!("  {description}");
            }
        }
    }
    Ok(())
}
