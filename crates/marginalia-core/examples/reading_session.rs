//! Reading session example
//!
//! Walks through selecting, adjusting, committing and searching over a small document.

use marginalia_core::{
    Adjustment, DismissReason, EngineConfig, HighlightColor, ReaderSession, Surface, TextIndex,
};
use marginalia_core::offsets::materialize_region;
use marginalia_core::search::SearchOptions;
use std::sync::{Arc, Mutex};

fn main() {
    let surface = Surface::from_paragraphs(&[
        "The quick brown fox jumps over the lazy dog. It was not amused.",
        "Later that day, the fox came back.",
    ]);
    let mut session = ReaderSession::new(surface, EngineConfig::default());

    let change_count = Arc::new(Mutex::new(0));
    let change_count_clone = change_count.clone();
    session.subscribe(move |change| {
        if let Ok(mut count) = change_count_clone.lock() {
            *count += 1;
            println!(
                "  change #{}: {:?} (version {} -> {})",
                count, change.change_type, change.old_version, change.new_version
            );
        }
    });

    println!("1. Select \"brown\" and grow it to the sentence:");
    let index = TextIndex::build(session.surface());
    let Some(region) = materialize_region(&index, 10, 15) else {
        return;
    };
    if let Ok(proposal) = session.capture_selection(&region.as_selection(), None) {
        println!("  proposal: {:?}", proposal.text);
    }
    if let Ok(outcome) = session.adjust_proposal(Adjustment::Sentence, None) {
        println!("  adjusted: {:?} ({:?})", session.proposal().map(|p| &p.text), outcome);
    }

    println!("\n2. Commit as a mint highlight:");
    match session.commit_proposal(HighlightColor::Mint) {
        Ok(id) => println!("  committed {id}"),
        Err(err) => println!("  commit failed: {err}"),
    }
    println!("  markup: {}", session.surface().to_markup());

    println!("\n3. Search for \"fox\":");
    let hits = session.set_search("fox", SearchOptions::default()).len();
    println!("  {hits} hits, counter {:?}", session.search().counter());
    session.next_hit();
    println!("  after next: counter {:?}", session.search().counter());
    println!("  markup: {}", session.surface().to_markup());

    session.dismiss_proposal(DismissReason::Explicit);
    session.clear_search();
    println!("\nversion: {}", session.version());
}
