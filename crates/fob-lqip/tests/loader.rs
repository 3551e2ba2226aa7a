//! Integration tests for the placeholder loader
//!
//! Analyses and emitters are mocked so each test can assert exactly which
//! collaborators were called.

use async_trait::async_trait;
use fob_lqip::{
    AnalysisError, AssetEmitter, ExportMatch, InlineAssetEmitter, LoaderContext, LqipError,
    LqipLoader, LqipOptions, MemoryLoaderContext, PlaceholderAnalyzer, extract_export,
};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Barrier;

const PREVIEW: &str = "data:image/png;base64,cHJldmlldw==";
const DATA_URI_MODULE: &str = r#"export default "data:image/png;base64,iVBORw0KGgo=";"#;

#[derive(Default, Clone)]
struct Calls {
    preview: Arc<AtomicUsize>,
    palette: Arc<AtomicUsize>,
    emit: Arc<AtomicUsize>,
}

impl Calls {
    fn preview(&self) -> usize {
        self.preview.load(Ordering::SeqCst)
    }

    fn palette(&self) -> usize {
        self.palette.load(Ordering::SeqCst)
    }

    fn emit(&self) -> usize {
        self.emit.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct MockAnalyzer {
    calls: Calls,
    fail_preview: bool,
    fail_palette: bool,
}

#[async_trait]
impl PlaceholderAnalyzer for MockAnalyzer {
    async fn preview(&self, path: &Path) -> Result<String, AnalysisError> {
        self.calls.preview.fetch_add(1, Ordering::SeqCst);
        if self.fail_preview {
            return Err(AnalysisError::unsupported_format(path));
        }
        Ok(PREVIEW.to_string())
    }

    async fn palette(&self, path: &Path) -> Result<Vec<String>, AnalysisError> {
        self.calls.palette.fetch_add(1, Ordering::SeqCst);
        if self.fail_palette {
            return Err(AnalysisError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other("disk on fire"),
            });
        }
        Ok(vec![
            "#ff0000".to_string(),
            "#00ff00".to_string(),
            "#0000ff".to_string(),
        ])
    }
}

/// Analyzer whose analyses only finish once both have started
struct RendezvousAnalyzer {
    barrier: Arc<Barrier>,
}

#[async_trait]
impl PlaceholderAnalyzer for RendezvousAnalyzer {
    async fn preview(&self, _path: &Path) -> Result<String, AnalysisError> {
        self.barrier.wait().await;
        Ok(PREVIEW.to_string())
    }

    async fn palette(&self, _path: &Path) -> Result<Vec<String>, AnalysisError> {
        self.barrier.wait().await;
        Ok(vec!["#123456".to_string()])
    }
}

/// Analyzer with a failing preview and a palette that needs several polls
#[derive(Default)]
struct SlowPaletteAnalyzer {
    palette_finished: Arc<AtomicUsize>,
}

#[async_trait]
impl PlaceholderAnalyzer for SlowPaletteAnalyzer {
    async fn preview(&self, path: &Path) -> Result<String, AnalysisError> {
        Err(AnalysisError::unsupported_format(path))
    }

    async fn palette(&self, _path: &Path) -> Result<Vec<String>, AnalysisError> {
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.palette_finished.fetch_add(1, Ordering::SeqCst);
        Ok(vec!["#123456".to_string()])
    }
}

struct MockEmitter {
    calls: Calls,
    output: String,
}

impl AssetEmitter for MockEmitter {
    fn emit(
        &self,
        _ctx: &dyn LoaderContext,
        _content: &[u8],
        _options: &LqipOptions,
    ) -> fob_lqip::Result<String> {
        self.calls.emit.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

fn loader(calls: &Calls) -> LqipLoader {
    LqipLoader::new()
        .with_analyzer(MockAnalyzer {
            calls: calls.clone(),
            ..Default::default()
        })
        .with_emitter(MockEmitter {
            calls: calls.clone(),
            output: r#"module.exports = __webpack_public_path__ + "hero-0badc0de.png";"#.to_string(),
        })
}

fn ctx(options: Option<Value>) -> MemoryLoaderContext {
    let ctx = MemoryLoaderContext::new(PathBuf::from("/project/src/hero.png"));
    match options {
        Some(options) => ctx.with_options(options),
        None => ctx,
    }
}

/// Parse `module.exports = {...};` back into its JSON object.
fn exported_object(module: &str) -> serde_json::Map<String, Value> {
    let ExportMatch::ArbitraryExpression(expr) = extract_export(module) else {
        panic!("not an expression export: {}", module);
    };
    match serde_json::from_str::<Value>(&expr).unwrap() {
        Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}

#[tokio::test]
async fn test_data_uri_literal_is_spliced_verbatim() {
    let calls = Calls::default();
    let module = loader(&calls)
        .run(&ctx(None), DATA_URI_MODULE.as_bytes())
        .await
        .unwrap();

    assert!(module.starts_with(r#"module.exports = {"src":"data:image/png;base64,iVBORw0KGgo=","#));
    let object = exported_object(&module);
    assert_eq!(object["src"], json!("data:image/png;base64,iVBORw0KGgo="));
    assert_eq!(calls.emit(), 0);
}

#[tokio::test]
async fn test_arbitrary_expression_is_spliced_raw() {
    let calls = Calls::default();
    let content = br#"module.exports = __webpack_public_path__ + "hero-1a2b3c4d.png";"#;
    let module = loader(&calls).run(&ctx(None), content).await.unwrap();

    assert_eq!(
        module,
        format!(
            r#"module.exports = {{"src":__webpack_public_path__ + "hero-1a2b3c4d.png","preSrc":"{}","palette":null}};"#,
            PREVIEW
        )
    );
    assert_eq!(calls.emit(), 0);
}

#[tokio::test]
async fn test_defaults_generate_preview_only() {
    let calls = Calls::default();
    let module = loader(&calls)
        .run(&ctx(None), DATA_URI_MODULE.as_bytes())
        .await
        .unwrap();

    let object = exported_object(&module);
    assert_eq!(object["preSrc"], json!(PREVIEW));
    assert_eq!(object["palette"], Value::Null);
    assert_eq!(calls.preview(), 1);
    assert_eq!(calls.palette(), 0);
}

#[tokio::test]
async fn test_palette_only() {
    let calls = Calls::default();
    let module = loader(&calls)
        .run(
            &ctx(Some(json!({ "base64": false, "palette": true }))),
            DATA_URI_MODULE.as_bytes(),
        )
        .await
        .unwrap();

    let object = exported_object(&module);
    assert_eq!(object["preSrc"], Value::Null);
    assert_eq!(object["palette"], json!(["#ff0000", "#00ff00", "#0000ff"]));
    assert_eq!(calls.preview(), 0);
    assert_eq!(calls.palette(), 1);
}

#[tokio::test]
async fn test_both_analyses() {
    let calls = Calls::default();
    let module = loader(&calls)
        .run(&ctx(Some(json!({ "palette": true }))), DATA_URI_MODULE.as_bytes())
        .await
        .unwrap();

    let object = exported_object(&module);
    assert_eq!(object["preSrc"], json!(PREVIEW));
    assert_eq!(object["palette"].as_array().map(Vec::len), Some(3));
    assert_eq!((calls.preview(), calls.palette()), (1, 1));
}

#[tokio::test]
async fn test_no_analyses_when_both_disabled() {
    let calls = Calls::default();
    let module = loader(&calls)
        .run(
            &ctx(Some(json!({ "base64": false, "palette": false }))),
            DATA_URI_MODULE.as_bytes(),
        )
        .await
        .unwrap();

    let object = exported_object(&module);
    assert_eq!(object["preSrc"], Value::Null);
    assert_eq!(object["palette"], Value::Null);
    assert_eq!(calls.preview(), 0);
    assert_eq!(calls.palette(), 0);
}

#[tokio::test]
async fn test_output_has_exactly_three_keys() {
    let calls = Calls::default();
    let module = loader(&calls)
        .run(&ctx(Some(json!({ "palette": true }))), DATA_URI_MODULE.as_bytes())
        .await
        .unwrap();

    let object = exported_object(&module);
    let keys: Vec<&str> = object.keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 3);
    for key in ["src", "preSrc", "palette"] {
        assert!(keys.contains(&key), "missing key {}", key);
    }
}

#[tokio::test]
async fn test_preview_failure_is_generic_even_if_palette_succeeds() {
    let calls = Calls::default();
    let loader = LqipLoader::new().with_analyzer(MockAnalyzer {
        calls: calls.clone(),
        fail_preview: true,
        ..Default::default()
    });

    let err = loader
        .run(&ctx(Some(json!({ "palette": true }))), DATA_URI_MODULE.as_bytes())
        .await
        .unwrap_err();

    assert!(matches!(err, LqipError::AnalysisFailed));
    assert_eq!(err.to_string(), fob_lqip::ANALYSIS_FAILED_MESSAGE);
    assert_eq!(calls.preview(), 1);
}

#[tokio::test]
async fn test_analyses_run_concurrently() {
    let loader = LqipLoader::new().with_analyzer(RendezvousAnalyzer {
        barrier: Arc::new(Barrier::new(2)),
    });

    let module = tokio::time::timeout(
        Duration::from_secs(5),
        loader.run(&ctx(Some(json!({ "palette": true }))), DATA_URI_MODULE.as_bytes()),
    )
    .await
    .expect("preview and palette should be awaited together")
    .unwrap();

    let object = exported_object(&module);
    assert_eq!(object["preSrc"], json!(PREVIEW));
    assert_eq!(object["palette"], json!(["#123456"]));
}

#[tokio::test]
async fn test_failed_preview_does_not_cancel_palette() {
    let analyzer = SlowPaletteAnalyzer::default();
    let palette_finished = analyzer.palette_finished.clone();
    let loader = LqipLoader::new().with_analyzer(analyzer);

    let err = loader
        .run(&ctx(Some(json!({ "palette": true }))), DATA_URI_MODULE.as_bytes())
        .await
        .unwrap_err();

    assert!(matches!(err, LqipError::AnalysisFailed));
    assert_eq!(palette_finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_palette_failure_is_generic() {
    let calls = Calls::default();
    let loader = LqipLoader::new().with_analyzer(MockAnalyzer {
        calls: calls.clone(),
        fail_palette: true,
        ..Default::default()
    });

    let err = loader
        .run(
            &ctx(Some(json!({ "base64": false, "palette": true }))),
            DATA_URI_MODULE.as_bytes(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LqipError::AnalysisFailed));
}

#[tokio::test]
async fn test_callback_invoked_once_with_error() {
    let calls = Calls::default();
    let loader = LqipLoader::new().with_analyzer(MockAnalyzer {
        calls: calls.clone(),
        fail_preview: true,
        ..Default::default()
    });

    let invoked = AtomicUsize::new(0);
    let mut outcome = None;
    loader
        .run_with_callback(&ctx(None), DATA_URI_MODULE.as_bytes(), |result| {
            invoked.fetch_add(1, Ordering::SeqCst);
            outcome = Some(result);
        })
        .await;

    assert_eq!(invoked.load(Ordering::SeqCst), 1);
    assert!(matches!(outcome, Some(Err(LqipError::AnalysisFailed))));
}

#[tokio::test]
async fn test_callback_receives_module_on_success() {
    let calls = Calls::default();
    let mut outcome = None;
    loader(&calls)
        .run_with_callback(&ctx(None), DATA_URI_MODULE.as_bytes(), |result| {
            outcome = Some(result);
        })
        .await;

    let module = outcome.unwrap().unwrap();
    assert!(module.starts_with("module.exports = {"));
}

#[tokio::test]
async fn test_raw_bytes_fall_back_to_emitter() {
    let calls = Calls::default();
    let png_header = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    let module = loader(&calls).run(&ctx(None), &png_header).await.unwrap();

    assert_eq!(calls.emit(), 1);
    assert!(module.starts_with(
        r#"module.exports = {"src":__webpack_public_path__ + "hero-0badc0de.png","#
    ));
}

#[tokio::test]
async fn test_unrecognized_emitter_output_is_typed_error() {
    let calls = Calls::default();
    let loader = loader(&calls).with_emitter(MockEmitter {
        calls: calls.clone(),
        output: "const url = 'hero.png';".to_string(),
    });

    let err = loader.run(&ctx(None), b"\x89PNG").await.unwrap_err();
    assert!(matches!(err, LqipError::UnrecognizedExport { .. }));
    assert_eq!(calls.emit(), 1);
    assert_eq!(calls.preview(), 0);
}

#[tokio::test]
async fn test_inline_emitter_fallback_round_trips() {
    let calls = Calls::default();
    let loader = loader(&calls).with_emitter(InlineAssetEmitter);

    let module = loader.run(&ctx(None), &[1, 2, 3]).await.unwrap();
    let object = exported_object(&module);
    assert_eq!(object["src"], json!("data:image/png;base64,AQID"));
}

#[tokio::test]
async fn test_default_file_emitter_emits_hashed_asset() {
    let calls = Calls::default();
    let loader = LqipLoader::new().with_analyzer(MockAnalyzer {
        calls: calls.clone(),
        ..Default::default()
    });
    let ctx = ctx(Some(json!({ "publicPath": "/static/" })));

    let module = loader.run(&ctx, b"\x89PNG raw").await.unwrap();

    let emitted = ctx.emitted_files();
    assert_eq!(emitted.len(), 1);
    let object = exported_object(&module);
    assert_eq!(object["src"], json!(format!("/static/{}", emitted[0].name)));
}

#[tokio::test]
async fn test_esm_export_style() {
    let calls = Calls::default();
    let module = loader(&calls)
        .run(
            &ctx(Some(json!({ "exportStyle": "esm", "base64": false }))),
            DATA_URI_MODULE.as_bytes(),
        )
        .await
        .unwrap();

    assert_eq!(
        module,
        r#"export default {"src":"data:image/png;base64,iVBORw0KGgo=","preSrc":null,"palette":null};"#
    );
}

#[tokio::test]
async fn test_loose_options_do_not_fail_the_module() {
    let calls = Calls::default();
    let module = loader(&calls)
        .run(
            &ctx(Some(json!({
                "base64": 1,
                "palette": "yes",
                "name": "img/[name].[hash].[ext]"
            }))),
            DATA_URI_MODULE.as_bytes(),
        )
        .await
        .unwrap();

    let object = exported_object(&module);
    assert_eq!(object["preSrc"], Value::Null);
    assert_eq!(object["palette"], Value::Null);
    assert_eq!(calls.preview(), 0);
    assert_eq!(calls.palette(), 0);
}

#[tokio::test]
async fn test_invalid_export_style_is_rejected_before_analysis() {
    let calls = Calls::default();
    let err = loader(&calls)
        .run(
            &ctx(Some(json!({ "exportStyle": "amd" }))),
            DATA_URI_MODULE.as_bytes(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LqipError::InvalidOptions(_)));
    assert_eq!(calls.preview(), 0);
}

#[tokio::test]
async fn test_marks_module_cacheable() {
    let calls = Calls::default();
    let ctx = ctx(None);
    loader(&calls)
        .run(&ctx, DATA_URI_MODULE.as_bytes())
        .await
        .unwrap();
    assert!(ctx.is_cacheable());
}
