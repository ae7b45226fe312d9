mod common;

use serde_json::json;
use shotdoc_pdf::{
    APPENDIX_TITLE, DrawOp, Error, FALLBACK_NOTICE, FontContext, RenderConfig, Weight,
    layout_request, measure, render_json, render_request_with, wrap,
};

use common::{all_texts, image_assets, png_data_url, request, shot, sized_texts};

#[test]
fn tutorial_without_shots_is_one_page() {
    let _ = env_logger::try_init();
    let req = request(json!({
        "schemaType": "tutorial",
        "enforceSchema": true,
        "structuredResult": {
            "templateId": "tutorial",
            "data": {
                "title": "T",
                "summary": "S",
                "steps": [{ "stepTitle": "Step 1", "description": "Do X" }]
            }
        },
        "shots": []
    }));
    let cfg = RenderConfig::default();
    let rendering = layout_request(&req, &cfg);

    assert_eq!(rendering.layout.pages.len(), 1);
    assert_eq!(rendering.layout.appendix_page, None);
    assert_eq!(
        sized_texts(&rendering.layout),
        vec![
            ("T".to_string(), 24.0),
            ("S".to_string(), 12.0),
            ("Step 1: Step 1".to_string(), 18.0),
            ("Do X".to_string(), 12.0),
        ]
    );

    let out = rendering.to_pdf(&cfg).unwrap();
    assert!(out.bytes.starts_with(b"%PDF"));
    assert_eq!(out.filename, "T.pdf");
    assert_eq!(out.page_count, 1);
    assert!(out.warnings.is_empty());
    assert_eq!(out.warnings_header(5), None);
}

#[test]
fn unparseable_raw_text_uses_fallback_with_notice() {
    let req = request(json!({
        "schemaType": "tutorial",
        "enforceSchema": true,
        "rawText": "Sorry, I cannot produce JSON today.",
        "shots": []
    }));
    let rendering = layout_request(&req, &RenderConfig::default());
    let texts = all_texts(&rendering.layout);
    assert_eq!(
        texts,
        vec![
            "Tutorial".to_string(),
            FALLBACK_NOTICE.to_string(),
            "Sorry, I cannot produce JSON today.".to_string(),
        ]
    );
}

#[test]
fn fallback_without_enforcement_has_no_notice() {
    let req = request(json!({
        "schemaType": "meetingSummary",
        "enforceSchema": false,
        "rawText": "plain words",
        "shots": []
    }));
    let rendering = layout_request(&req, &RenderConfig::default());
    assert_eq!(
        all_texts(&rendering.layout),
        vec!["Meeting Summary".to_string(), "plain words".to_string()]
    );
}

#[test]
fn undecodable_shot_produces_warning_and_no_appendix() {
    let req = request(json!({
        "schemaType": "tutorial",
        "enforceSchema": false,
        "structuredResult": { "templateId": "tutorial", "data": { "steps": [] } },
        "shots": [shot("s1", "data:image/png;base64,AAAA")]
    }));
    let cfg = RenderConfig::default();
    let rendering = layout_request(&req, &cfg);
    assert!(rendering.assets.is_empty());
    assert_eq!(rendering.layout.appendix_page, None);
    assert_eq!(rendering.layout.pages.len(), 1);

    let out = rendering.to_pdf(&cfg).unwrap();
    assert_eq!(out.warnings.len(), 1);
    assert!(out.warnings[0].contains("s1"));
    assert!(out.warnings_header(5).unwrap().contains("s1"));
}

#[test]
fn key_topics_render_in_order_field_order() {
    let req = request(json!({
        "schemaType": "meetingSummary",
        "enforceSchema": true,
        "structuredResult": {
            "templateId": "meetingSummary",
            "data": {
                "title": "Weekly sync",
                "date": "2024-05-01",
                "keyTopics": [
                    { "order": 2, "topic": "Hiring", "details": "Two open roles" },
                    { "order": 1, "topic": "Roadmap", "speaker": "Dana" }
                ]
            }
        },
        "shots": []
    }));
    let rendering = layout_request(&req, &RenderConfig::default());
    let texts = all_texts(&rendering.layout);
    let first = texts.iter().position(|t| t == "1. Roadmap").unwrap();
    let second = texts.iter().position(|t| t == "2. Hiring").unwrap();
    assert!(first < second);
    assert!(texts.contains(&"Date: 2024-05-01".to_string()));
    assert!(texts.contains(&"Speaker: Dana".to_string()));
}

#[test]
fn long_paragraph_wraps_within_content_width() {
    let cfg = RenderConfig::default();
    let fonts = FontContext::standard();
    let face = fonts.face(Weight::Regular);
    let text = "Open the settings panel and choose the integrations tab, then scroll down \
                until the webhook section appears and paste the endpoint you copied earlier.";
    assert!(measure(text, face, cfg.body_size) > cfg.content_width());

    let lines = wrap(text, face, cfg.body_size, cfg.content_width());
    assert!(lines.len() >= 2);
    for line in &lines {
        assert!(measure(line, face, cfg.body_size) <= cfg.content_width());
    }
    assert_eq!(lines.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
}

#[test]
fn appendix_lists_every_asset_in_order() {
    let url = png_data_url(64, 48);
    let req = request(json!({
        "schemaType": "tutorial",
        "enforceSchema": true,
        "structuredResult": {
            "templateId": "tutorial",
            "data": {
                "title": "Setup",
                "steps": [
                    { "stepTitle": "Login", "screenshotIds": ["s2", "missing"] }
                ]
            }
        },
        "shots": [
            { "id": "s1", "label": "Home", "timecode": "00:01", "dataUrl": url },
            { "id": "s2", "timecode": "00:05", "note": "Click the blue button", "dataUrl": url }
        ]
    }));
    let rendering = layout_request(&req, &RenderConfig::default());
    let layout = &rendering.layout;

    assert_eq!(rendering.assets.ids(), vec!["s1", "s2"]);
    let appendix = layout.appendix_page.expect("appendix page");
    assert_eq!(appendix, layout.pages.len() - 1);

    let appendix_page = &layout.pages[appendix];
    let texts: Vec<&str> = appendix_page.texts().collect();
    assert_eq!(
        texts,
        vec![APPENDIX_TITLE, "Home (00:01)", "s2 (00:05)", "Click the blue button"]
    );
    assert_eq!(appendix_page.image_count(), 2);

    // Inline s2 in the body, then both assets again in the appendix.
    assert_eq!(image_assets(layout), vec![1, 0, 1]);
}

#[test]
fn images_scale_to_width_and_height_caps() {
    let req = request(json!({
        "schemaType": "tutorial",
        "enforceSchema": false,
        "structuredResult": { "templateId": "tutorial", "data": { "steps": [] } },
        "shots": [
            shot("wide", &png_data_url(1032, 100)),
            shot("tall", &png_data_url(100, 560)),
            shot("small", &png_data_url(40, 20))
        ]
    }));
    let rendering = layout_request(&req, &RenderConfig::default());
    let sizes: Vec<(f32, f32, f32)> = rendering
        .layout
        .pages
        .iter()
        .flat_map(|p| p.ops.iter())
        .filter_map(|op| match op {
            DrawOp::Image { x, width, height, .. } => Some((*x, *width, *height)),
            DrawOp::Text { .. } => None,
        })
        .collect();
    assert_eq!(sizes.len(), 3);
    assert_eq!((sizes[0].1, sizes[0].2), (516.0, 50.0));
    assert_eq!((sizes[1].1, sizes[1].2), (50.0, 280.0));
    assert_eq!((sizes[2].1, sizes[2].2), (40.0, 20.0));
    // Centered in the content box.
    assert_eq!(sizes[0].0, 48.0);
    assert_eq!(sizes[2].0, 48.0 + (516.0 - 40.0) / 2.0);
}

#[test]
fn long_documents_paginate_within_margins() {
    let url = png_data_url(300, 200);
    let steps: Vec<_> = (0..40)
        .map(|i| {
            json!({
                "stepTitle": format!("Part {i}"),
                "description": "Carefully follow the instructions shown on screen. ".repeat(6),
                "startTime": "00:00",
                "screenshotIds": ["s1"]
            })
        })
        .collect();
    let req = request(json!({
        "schemaType": "tutorial",
        "enforceSchema": true,
        "structuredResult": { "templateId": "tutorial", "data": { "title": "Long", "steps": steps } },
        "shots": [shot("s1", &url)]
    }));
    let cfg = RenderConfig::default();
    let rendering = layout_request(&req, &cfg);
    assert!(rendering.layout.pages.len() > 5);

    for page in &rendering.layout.pages {
        assert!(!page.ops.is_empty());
        for op in &page.ops {
            match op {
                DrawOp::Text { baseline, size, .. } => {
                    assert!(*baseline >= cfg.margin, "text below margin: {op:?}");
                    assert!(*baseline + *size <= cfg.top() + 1e-3, "text above top: {op:?}");
                }
                DrawOp::Image { y, height, .. } => {
                    assert!(*y >= cfg.margin, "image below margin: {op:?}");
                    assert!(*y + *height <= cfg.top() + 1e-3);
                }
            }
        }
    }

    // Step numbering follows position when no number is given.
    let texts = all_texts(&rendering.layout);
    assert!(texts.contains(&"Step 40: Part 39".to_string()));
}

#[test]
fn layout_is_deterministic() {
    let url = png_data_url(20, 20);
    let req = request(json!({
        "schemaType": "meetingSummary",
        "enforceSchema": true,
        "structuredResult": {
            "templateId": "meetingSummary",
            "data": {
                "attendees": [{ "name": "Ana", "role": "Lead", "department": "Ops" }],
                "decisions": [{ "description": "Ship it", "owners": ["Ana"] }],
                "actionItems": [{ "task": "Write notes", "owner": "Bo", "dueDate": "Mon" }],
                "followUps": ["Check metrics"]
            }
        },
        "shots": [shot("b", &url), shot("a", &url)]
    }));
    let cfg = RenderConfig::default();
    let first = layout_request(&req, &cfg);
    let second = layout_request(&req, &cfg);
    assert_eq!(first.assets.ids(), vec!["b", "a"]);
    assert_eq!(first.assets.ids(), second.assets.ids());
    assert_eq!(first.layout, second.layout);
    assert_eq!(first.variant, second.variant);

    let texts = all_texts(&first.layout);
    for expected in [
        "Meeting Summary",
        "Attendees",
        "Ana · Lead · Ops",
        "1. Ship it",
        "Owners: Ana",
        "1. Write notes (Owner: Bo)",
        "Due: Mon",
        "Follow Ups",
        "1. Check metrics",
    ] {
        assert!(texts.contains(&expected.to_string()), "missing {expected:?}");
    }
}

#[test]
fn render_json_rejects_malformed_requests() {
    let err = render_json(b"{ not json", &RenderConfig::default())
        .err()
        .expect("malformed JSON must fail");
    assert!(matches!(err, Error::Json(_)));
}

#[test]
fn pdf_embeds_each_asset_once() {
    let url = png_data_url(10, 10);
    let req = request(json!({
        "schemaType": "tutorial",
        "enforceSchema": false,
        "structuredResult": {
            "templateId": "tutorial",
            "data": { "title": "Q3 / Review: \"Final\"", "steps": [{ "title": "One", "screenshotIds": ["s1"] }] }
        },
        "shots": [shot("s1", &url)]
    }));
    let out = render_request_with(&req, &RenderConfig::default()).unwrap();
    assert_eq!(out.page_count, 2);
    assert_eq!(out.filename, "Q3-Review-Final.pdf");

    let body = String::from_utf8_lossy(&out.bytes);
    assert_eq!(body.matches("/Subtype /Image").count(), 1);
    assert!(body.contains("/BaseFont /Helvetica-Bold"));
}
