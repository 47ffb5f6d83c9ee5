//! Property tests for the video stage hand-off.
//!
//! 1. Ordering: images appear in the encoder arguments exactly in request order
//! 2. Duration: the final `-t` equals cards + seconds_per_image × images
//! 3. Concat: one concat segment per input

use moverlab_core::chart::chart_file_name;
use moverlab_runner::{AssemblyRequest, FfmpegAssembler, TitleCard};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;

fn request(symbols: &[String], seconds_per_image: f64, cards: bool) -> AssemblyRequest {
    let card = |text: &str| {
        cards.then(|| TitleCard {
            text: text.to_string(),
            seconds: 3.0,
        })
    };
    AssemblyRequest {
        images: symbols
            .iter()
            .map(|s| PathBuf::from("charts").join(chart_file_name(s, 30)))
            .collect(),
        seconds_per_image,
        overlays: BTreeMap::new(),
        audio: None,
        output: PathBuf::from("videos/out.mp4"),
        intro: card("intro"),
        outro: card("outro"),
        width: 1080,
        height: 1920,
        fps: 24,
    }
}

fn symbols() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[A-Z]{2,5}", 1..12)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

proptest! {
    #[test]
    fn images_stay_in_request_order(symbols in symbols(), cards in any::<bool>()) {
        let r = request(&symbols, 4.0, cards);
        let args = FfmpegAssembler::new("ffmpeg").build_args(&r, None);
        let positions: Vec<usize> = r
            .images
            .iter()
            .map(|img| {
                let text = img.display().to_string();
                args.iter().position(|a| *a == text).unwrap()
            })
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn output_duration_matches_request(
        symbols in symbols(),
        seconds in 1u32..10,
        cards in any::<bool>(),
    ) {
        let r = request(&symbols, f64::from(seconds), cards);
        let args = FfmpegAssembler::new("ffmpeg").build_args(&r, None);
        let t = args.iter().rposition(|a| a == "-t").unwrap();
        let expected = f64::from(seconds) * symbols.len() as f64 + if cards { 6.0 } else { 0.0 };
        prop_assert_eq!(args[t + 1].clone(), format!("{expected:.3}"));
        prop_assert!((r.total_seconds() - expected).abs() < 1e-9);
    }

    #[test]
    fn concat_covers_every_input(symbols in symbols(), cards in any::<bool>()) {
        let r = request(&symbols, 4.0, cards);
        let args = FfmpegAssembler::new("ffmpeg").build_args(&r, None);
        let graph = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        let inputs = symbols.len() + if cards { 2 } else { 0 };
        let expected = format!("concat=n={inputs}:v=1:a=0[outv]");
        prop_assert!(graph.ends_with(&expected));
    }
}
