use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use favgen_core::{
    fingerprint, icon_file_name, AssetId, AssetRef, Crop, DocId, GroupKey, IconFile, PipelineError,
    Rendition, RunOutcome, Selection, SettingsDoc, UserId, ICON_SIZES, UNSET_FINGERPRINT,
};
use favgen_pipeline::{Config, Pipeline, Workspace};
use favgen_store::{InMemoryAssetStore, InMemoryDocStore, RecordingNotifier};
use favgen_transcode::Transcoder;
use tempfile::TempDir;

/// Counts invocations and writes a stub PNG per requested size.
#[derive(Default)]
struct FakeTranscoder {
    calls: AtomicUsize,
}

impl FakeTranscoder {
    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transcoder for FakeTranscoder {
    fn transcode(&self, source: &Path, out_dir: &Path, sizes: &[u32]) -> anyhow::Result<Vec<IconFile>> {
        assert!(source.exists(), "transcoder handed a missing source file");
        self.calls.fetch_add(1, Ordering::SeqCst);
        sizes
            .iter()
            .map(|&size| {
                let path = out_dir.join(icon_file_name(size));
                std::fs::write(&path, size.to_le_bytes())?;
                Ok(IconFile { size, path })
            })
            .collect()
    }
}

/// Delays inside the call and records whether it was ever entered while
/// another call was still in flight.
#[derive(Default)]
struct SlowTranscoder {
    inner: FakeTranscoder,
    in_flight: AtomicUsize,
    overlapped: AtomicBool,
}

impl Transcoder for SlowTranscoder {
    fn transcode(&self, source: &Path, out_dir: &Path, sizes: &[u32]) -> anyhow::Result<Vec<IconFile>> {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
        let result = self.inner.transcode(source, out_dir, sizes);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Panics on the first call, behaves normally afterwards.
#[derive(Default)]
struct FlakyTranscoder {
    inner: FakeTranscoder,
    calls: AtomicUsize,
}

impl Transcoder for FlakyTranscoder {
    fn transcode(&self, source: &Path, out_dir: &Path, sizes: &[u32]) -> anyhow::Result<Vec<IconFile>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("simulated crash mid-run");
        }
        self.inner.transcode(source, out_dir, sizes)
    }
}

struct FailingTranscoder;

impl Transcoder for FailingTranscoder {
    fn transcode(&self, _source: &Path, _out_dir: &Path, _sizes: &[u32]) -> anyhow::Result<Vec<IconFile>> {
        Err(anyhow::anyhow!("convert exited with signal 11"))
    }
}

struct Harness {
    pipeline: Arc<Pipeline>,
    assets: Arc<InMemoryAssetStore>,
    docs: Arc<InMemoryDocStore>,
    notifier: Arc<RecordingNotifier>,
    transcoder: Arc<FakeTranscoder>,
    _root: TempDir,
}

fn renditions() -> Vec<Rendition> {
    vec![
        Rendition { name: "one-sixth".into(), width: 190, height: 350 },
        Rendition { name: "one-third".into(), width: 380, height: 700 },
        Rendition { name: "full".into(), width: 1140, height: 1140 },
    ]
}

fn harness_with(transcoder: Arc<dyn Transcoder>) -> (Arc<Pipeline>, Arc<InMemoryAssetStore>, Arc<InMemoryDocStore>, Arc<RecordingNotifier>, TempDir) {
    let root = TempDir::new().unwrap();
    let mut cfg = Config::default_for(root.path());
    cfg.storage.temp_root = root.path().join("tmp").to_string_lossy().into_owned();

    let assets = Arc::new(InMemoryAssetStore::new("https://cdn.example.com", renditions()));
    let docs = Arc::new(InMemoryDocStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let pipeline = Arc::new(Pipeline::new(
        cfg,
        assets.clone(),
        docs.clone(),
        transcoder,
        notifier.clone(),
    ));
    (pipeline, assets, docs, notifier, root)
}

fn harness() -> Harness {
    let transcoder = Arc::new(FakeTranscoder::default());
    let (pipeline, assets, docs, notifier, root) = harness_with(transcoder.clone());
    Harness { pipeline, assets, docs, notifier, transcoder, _root: root }
}

fn selection(asset: &str) -> Selection {
    Selection {
        asset: Some(AssetRef { id: AssetId::from_str(asset), extension: "png".into() }),
        crop: None,
    }
}

fn seed(h: &Harness, doc_id: &str, group: Option<&str>, sel: Selection) -> DocId {
    let id = DocId::from_str(doc_id);
    let mut doc = SettingsDoc::new(id.clone(), group.map(GroupKey::from_str));
    doc.selection = sel;
    h.docs.insert(doc);
    id
}

fn seed_source(h: &Harness) {
    h.assets.put_object("attachments/a1.one-third.png", b"source-bytes".to_vec());
}

#[test]
fn full_build_produces_complete_size_set_and_markup() {
    let h = harness();
    seed_source(&h);
    let id = seed(&h, "global", None, selection("a1"));

    let outcome = h.pipeline.build(&id, None).unwrap();
    assert_eq!(outcome, RunOutcome::Built);

    // exactly one upload per size, no more, no fewer
    let uploads = h.assets.uploads();
    assert_eq!(uploads.len(), ICON_SIZES.len());
    for size in ICON_SIZES {
        assert!(h.assets.object(&format!("/favicons/favicon-{}.png", size)).is_some());
    }

    let doc = h.docs.get(&id).unwrap();
    let lines: Vec<&str> = doc.favicon_links.lines().collect();
    assert_eq!(lines.len(), 7);
    for (line, expected) in lines.iter().zip([
        ("icon", 32),
        ("icon", 128),
        ("icon", 192),
        ("shortcut icon", 196),
        ("apple-touch-icon", 152),
        ("apple-touch-icon", 167),
        ("apple-touch-icon", 180),
    ]) {
        assert!(line.contains(&format!("rel=\"{}\"", expected.0)), "line {} lacks rel {}", line, expected.0);
        assert!(line.contains(&format!(
            "href=\"https://cdn.example.com/favicons/favicon-{}.png\"",
            expected.1
        )));
        assert!(line.contains(&format!("sizes=\"{}x{}\"", expected.1, expected.1)));
    }
    assert_eq!(doc.favicon_fingerprint, fingerprint(&doc.selection));
}

#[test]
fn second_build_of_unchanged_selection_is_a_noop() {
    let h = harness();
    seed_source(&h);
    let id = seed(&h, "global", None, selection("a1"));

    assert_eq!(h.pipeline.build(&id, None).unwrap(), RunOutcome::Built);
    assert_eq!(h.pipeline.build(&id, None).unwrap(), RunOutcome::Skipped);

    // one transcode and one upload batch in total across both invocations
    assert_eq!(h.transcoder.call_count(), 1);
    assert_eq!(h.assets.uploads().len(), ICON_SIZES.len());
}

#[test]
fn crop_change_forces_a_rebuild() {
    let h = harness();
    seed_source(&h);
    h.assets.put_object("attachments/a1.10.10.300.300.one-third.png", b"cropped".to_vec());
    let id = seed(&h, "global", None, selection("a1"));

    assert_eq!(h.pipeline.build(&id, None).unwrap(), RunOutcome::Built);

    let mut doc = h.docs.get(&id).unwrap();
    doc.selection.crop = Some(Crop { left: 10, top: 10, width: 300, height: 300 });
    h.docs.insert(doc);

    assert_eq!(h.pipeline.build(&id, None).unwrap(), RunOutcome::Built);
    assert_eq!(h.transcoder.call_count(), 2);
}

#[test]
fn emptied_selection_clears_persisted_state() {
    let h = harness();
    seed_source(&h);
    let id = seed(&h, "global", None, selection("a1"));
    assert_eq!(h.pipeline.build(&id, None).unwrap(), RunOutcome::Built);

    let mut doc = h.docs.get(&id).unwrap();
    doc.selection = Selection::default();
    h.docs.insert(doc);

    assert_eq!(h.pipeline.build(&id, None).unwrap(), RunOutcome::Cleared);
    let doc = h.docs.get(&id).unwrap();
    assert_eq!(doc.favicon_links, "");
    assert_eq!(doc.favicon_fingerprint, UNSET_FINGERPRINT);
    // clearing does not re-run the tool
    assert_eq!(h.transcoder.call_count(), 1);
}

#[test]
fn vanished_asset_clears_instead_of_failing() {
    let h = harness();
    // selection points at an asset that no longer exists in storage
    let id = seed(&h, "global", None, selection("a1"));

    assert_eq!(h.pipeline.build(&id, None).unwrap(), RunOutcome::Cleared);
    let doc = h.docs.get(&id).unwrap();
    assert_eq!(doc.favicon_links, "");
    assert_eq!(doc.favicon_fingerprint, UNSET_FINGERPRINT);
}

#[test]
fn workspace_is_removed_after_success() {
    let h = harness();
    seed_source(&h);
    let id = seed(&h, "global", None, selection("a1"));
    h.pipeline.build(&id, None).unwrap();

    let ws = Workspace::for_doc(&h.pipeline.config().temp_root(), id.as_str());
    assert!(!ws.path().exists());
}

#[test]
fn workspace_is_removed_after_transcoder_failure() {
    let (pipeline, assets, docs, notifier, _root) = harness_with(Arc::new(FailingTranscoder));
    assets.put_object("attachments/a1.one-third.png", b"source-bytes".to_vec());
    let id = DocId::from_str("global");
    let mut doc = SettingsDoc::new(id.clone(), None);
    doc.selection = selection("a1");
    docs.insert(doc);

    let user = UserId::from_str("editor-1");
    let err = pipeline.build(&id, Some(&user)).unwrap_err();
    assert!(matches!(err, PipelineError::Processing(_)));

    let ws = Workspace::for_doc(&pipeline.config().temp_root(), id.as_str());
    assert!(!ws.path().exists());

    // failure is surfaced to the user and nothing was persisted
    let messages = notifier.messages();
    assert!(messages.iter().any(|(_, m)| m.contains("error occurred")));
    assert_eq!(docs.get(&id).unwrap().favicon_fingerprint, UNSET_FINGERPRINT);
    assert!(assets.uploads().is_empty());
}

#[test]
fn group_members_receive_identical_fields() {
    let h = harness();
    seed_source(&h);
    let live = seed(&h, "live", Some("g1"), selection("a1"));
    let draft = seed(&h, "draft", Some("g1"), Selection::default());

    h.pipeline.build(&live, None).unwrap();

    let live_doc = h.docs.get(&live).unwrap();
    let draft_doc = h.docs.get(&draft).unwrap();
    assert!(!live_doc.favicon_links.is_empty());
    assert_eq!(live_doc.favicon_links, draft_doc.favicon_links);
    assert_eq!(live_doc.favicon_fingerprint, draft_doc.favicon_fingerprint);
}

#[test]
fn ungrouped_document_updates_alone() {
    let h = harness();
    seed_source(&h);
    let id = seed(&h, "global", None, selection("a1"));
    let bystander = seed(&h, "other", None, Selection::default());

    h.pipeline.build(&id, None).unwrap();

    assert!(!h.docs.get(&id).unwrap().favicon_links.is_empty());
    assert_eq!(h.docs.get(&bystander).unwrap().favicon_links, "");
}

#[test]
fn progress_notifications_reach_the_user() {
    let h = harness();
    seed_source(&h);
    let id = seed(&h, "global", None, selection("a1"));

    let user = UserId::from_str("editor-1");
    h.pipeline.build(&id, Some(&user)).unwrap();

    let messages: Vec<String> = h.notifier.messages().into_iter().map(|(_, m)| m).collect();
    assert_eq!(
        messages,
        vec!["Processing favicon files...".to_string(), "Favicon processing complete.".to_string()]
    );
}

#[test]
fn no_user_means_no_notifications() {
    let h = harness();
    seed_source(&h);
    let id = seed(&h, "global", None, selection("a1"));
    h.pipeline.build(&id, None).unwrap();
    assert!(h.notifier.messages().is_empty());
}

#[test]
fn save_trigger_runs_detached() {
    let h = harness();
    seed_source(&h);
    let id = seed(&h, "global", None, selection("a1"));

    let handle = h.pipeline.on_document_saved(id.clone(), None).expect("trigger should fire");
    handle.join().unwrap();

    assert_eq!(h.transcoder.call_count(), 1);
    assert!(!h.docs.get(&id).unwrap().favicon_links.is_empty());
}

#[test]
fn concurrent_builds_for_one_document_serialize() {
    let transcoder = Arc::new(SlowTranscoder::default());
    let (pipeline, assets, docs, _notifier, _root) = harness_with(transcoder.clone());
    assets.put_object("attachments/a1.one-third.png", b"source-bytes".to_vec());
    let id = DocId::from_str("global");
    let mut doc = SettingsDoc::new(id.clone(), None);
    doc.selection = selection("a1");
    docs.insert(doc);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let pipeline = pipeline.clone();
            let id = id.clone();
            std::thread::spawn(move || pipeline.build(&id, None).unwrap())
        })
        .collect();
    let mut outcomes: Vec<RunOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // the per-document lock keeps the tool single-entrant, and the second
    // run observes the first run's fingerprint instead of racing it
    assert!(!transcoder.overlapped.load(Ordering::SeqCst));
    assert_eq!(transcoder.inner.call_count(), 1);
    outcomes.sort_by_key(|o| *o == RunOutcome::Skipped);
    assert_eq!(outcomes, vec![RunOutcome::Built, RunOutcome::Skipped]);
    assert_eq!(assets.uploads().len(), ICON_SIZES.len());
}

#[test]
fn panicked_run_does_not_wedge_later_builds() {
    let transcoder = Arc::new(FlakyTranscoder::default());
    let (pipeline, assets, docs, _notifier, _root) = harness_with(transcoder.clone());
    assets.put_object("attachments/a1.one-third.png", b"source-bytes".to_vec());
    let id = DocId::from_str("global");
    let mut doc = SettingsDoc::new(id.clone(), None);
    doc.selection = selection("a1");
    docs.insert(doc);

    let crashed = {
        let pipeline = pipeline.clone();
        let id = id.clone();
        std::thread::spawn(move || pipeline.build(&id, None))
    };
    assert!(crashed.join().is_err());

    // the document lock was held across the panic; the next build must
    // still get through and succeed
    assert_eq!(pipeline.build(&id, None).unwrap(), RunOutcome::Built);
    assert!(!docs.get(&id).unwrap().favicon_links.is_empty());
}

#[test]
fn save_trigger_skipped_in_asset_build_only_mode() {
    let transcoder = Arc::new(FakeTranscoder::default());
    let root = TempDir::new().unwrap();
    let mut cfg = Config::default_for(root.path());
    cfg.storage.temp_root = root.path().join("tmp").to_string_lossy().into_owned();
    cfg.runtime.asset_build_only = true;

    let assets = Arc::new(InMemoryAssetStore::new("https://cdn.example.com", renditions()));
    let docs = Arc::new(InMemoryDocStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let pipeline = Arc::new(Pipeline::new(cfg, assets, docs, transcoder.clone(), notifier));

    assert!(pipeline.on_document_saved(DocId::from_str("global"), None).is_none());
    assert_eq!(transcoder.call_count(), 0);
}
