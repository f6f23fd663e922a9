use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv_to_mdx::materializer::DEFAULT_PLACEHOLDER;
use csv_to_mdx::{Config, CsvProcessor, ErrorMode, RunReport};
use tempfile::TempDir;
use walkdir::WalkDir;

fn setup(csv: &str) -> (TempDir, Config) {
    setup_bytes(csv.as_bytes())
}

fn setup_bytes(csv: &[u8]) -> (TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("games.csv");
    fs::write(&csv_path, csv).unwrap();
    let mut config = Config::new(&csv_path, dir.path().join("games"));
    config.options.date = NaiveDate::from_ymd_opt(2024, 5, 1);
    (dir, config)
}

fn generated_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

fn run(config: Config) -> RunReport {
    CsvProcessor::new(config).run().unwrap()
}

#[test]
fn rows_in_same_category_get_distinct_files() {
    let (_dir, config) = setup("title,cate\nPac Man,arcade\nGalaga,arcade\n");
    let root = config.output_root.clone();
    let report = run(config);

    assert_eq!(report.files_written, 2);
    assert_eq!(
        generated_files(&root),
        vec![
            PathBuf::from("arcade/galaga.mdx"),
            PathBuf::from("arcade/pac-man.mdx")
        ]
    );
}

#[test]
fn blank_category_lands_at_root() {
    let (_dir, config) = setup("title,cate\nTetris,\nSnake,  \n");
    let root = config.output_root.clone();
    run(config);

    assert_eq!(
        generated_files(&root),
        vec![PathBuf::from("snake.mdx"), PathBuf::from("tetris.mdx")]
    );
}

#[test]
fn explicit_filename_ignores_title() {
    let (_dir, config) = setup("title,cate,filename\nSome Long Title!,guides,custom-name\n");
    let root = config.output_root.clone();
    run(config);

    assert_eq!(
        generated_files(&root),
        vec![PathBuf::from("guides/custom-name.mdx")]
    );
}

#[test]
fn file_contents_follow_header_layout() {
    let (_dir, config) = setup(
        "title,cover,game,cate,content\n\"Zelda: Link's Awakening\",/c/z.png,https://g/z,rpg,\"Line one, with comma\nLine two\"\n",
    );
    let root = config.output_root.clone();
    run(config);

    let text = fs::read_to_string(root.join("rpg").join("zelda-link-s-awakening.mdx")).unwrap();
    assert_eq!(
        text,
        "---\ntitle: Zelda: Link's Awakening\ncover: /c/z.png\ndescription: \ndate: 2024-05-01\n---\n\n# Zelda: Link's Awakening\n\nLine one, with comma\nLine two"
    );
}

#[test]
fn missing_content_uses_placeholder() {
    let (_dir, config) = setup("title\nPong\n");
    let root = config.output_root.clone();
    run(config);

    let text = fs::read_to_string(root.join("pong.mdx")).unwrap();
    assert!(text.ends_with(&format!("# Pong\n\n{DEFAULT_PLACEHOLDER}")));
}

#[test]
fn unrecognized_columns_are_ignored() {
    let (_dir, config) = setup("title,rating,content\nPong,5,Classic\n");
    let root = config.output_root.clone();
    run(config);

    let text = fs::read_to_string(root.join("pong.mdx")).unwrap();
    assert!(!text.contains("rating"));
    assert!(text.ends_with("# Pong\n\nClassic"));
}

#[test]
fn strict_mode_stops_at_first_bad_row() {
    let (_dir, config) = setup("title,cate\nPong,arcade\n日本語,arcade\nGalaga,arcade\n");
    let root = config.output_root.clone();
    let err = CsvProcessor::new(config).run().unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("Line 3"), "{message}");
    assert_eq!(generated_files(&root), vec![PathBuf::from("arcade/pong.mdx")]);
}

#[test]
fn lenient_mode_skips_and_counts_failures() {
    let (_dir, mut config) = setup("title,cate\nPong,arcade\n!!!,arcade\nGalaga,arcade\n");
    config.mode = ErrorMode::Lenient;
    let root = config.output_root.clone();
    let report = run(config);

    assert_eq!(report.rows_read, 3);
    assert_eq!(report.files_written, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].line, 3);
    assert_eq!(report.failures[0].kind, "invalid_output_path");
    assert!(!report.is_success());
    assert_eq!(generated_files(&root).len(), 2);
}

#[test]
fn missing_title_column_names_the_field() {
    let (_dir, mut config) = setup("name,cate\nPong,arcade\n");
    config.mode = ErrorMode::Lenient;
    let report = run(config);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, "missing_required_field");
    assert!(report.failures[0].error.contains("title"));
}

#[test]
fn colliding_paths_are_reported_and_last_row_wins() {
    let (_dir, config) = setup("title,content\nPac-Man,first\nPac Man,second\n");
    let root = config.output_root.clone();
    let report = run(config);

    assert!(report.is_success());
    assert_eq!(report.collisions.len(), 1);
    assert_eq!(report.collisions[0].first_line, 2);
    assert_eq!(report.collisions[0].line, 3);
    assert!(!report.collisions[0].case_only);
    let text = fs::read_to_string(root.join("pac-man.mdx")).unwrap();
    assert!(text.ends_with("second"));
}

#[test]
fn dry_run_writes_nothing() {
    let (_dir, mut config) = setup("title,cate\nPong,arcade\n");
    config.dry_run = true;
    let root = config.output_root.clone();
    let report = run(config);

    assert_eq!(report.files_written, 1);
    assert!(!root.exists());
}

#[test]
fn report_file_is_written_as_json() {
    let (dir, mut config) = setup("title\nPong\n\u{2603}\n");
    config.mode = ErrorMode::Lenient;
    let report_path = dir.path().join("reports").join("run.json");
    config.report_path = Some(report_path.clone());
    run(config);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report_path).unwrap()).unwrap();
    assert_eq!(json["rows_read"], 2);
    assert_eq!(json["files_written"], 1);
    assert_eq!(json["failures"][0]["line"], 3);
}

#[test]
fn failure_lines_count_blank_lines() {
    let (_dir, mut config) = setup("title\nPong\n\n\n!!!\n\r\nGalaga\n\u{2603}\n");
    config.mode = ErrorMode::Lenient;
    let report = run(config);

    let lines: Vec<u64> = report.failures.iter().map(|f| f.line).collect();
    assert_eq!(lines, vec![5, 8]);
    assert_eq!(report.files_written, 2);
}

#[test]
fn strict_error_reports_physical_line() {
    let (_dir, config) = setup("title\n\nPong\n\n!!!\n");
    let err = CsvProcessor::new(config).run().unwrap_err();
    assert!(format!("{err:#}").contains("Line 5"), "{err:#}");
}

#[test]
fn undecodable_row_is_a_malformed_record() {
    let (_dir, mut config) = setup_bytes(b"title,cate\nPong,arcade\n\n\nBad\xFF\xFE,arcade\nGalaga,arcade\n");
    config.mode = ErrorMode::Lenient;
    let root = config.output_root.clone();
    let report = run(config);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, "malformed_record");
    assert_eq!(report.failures[0].line, 5);
    assert_eq!(report.failures[0].title, None);
    assert_eq!(
        generated_files(&root),
        vec![
            PathBuf::from("arcade/galaga.mdx"),
            PathBuf::from("arcade/pong.mdx")
        ]
    );
}

#[test]
fn category_outside_root_is_rejected() {
    let (dir, mut config) = setup("title,cate\nPong,..\nPac Man,/tmp\nGalaga,arcade\n");
    config.mode = ErrorMode::Lenient;
    let root = config.output_root.clone();
    let report = run(config);

    let kinds: Vec<&str> = report.failures.iter().map(|f| f.kind.as_str()).collect();
    assert_eq!(kinds, vec!["invalid_output_path", "invalid_output_path"]);
    assert!(!dir.path().join("pong.mdx").exists());
    assert_eq!(generated_files(&root), vec![PathBuf::from("arcade/galaga.mdx")]);
}

#[test]
fn category_blocked_by_regular_file_is_invalid_path() {
    let (_dir, mut config) = setup("title,cate\nPong,arcade\n");
    config.mode = ErrorMode::Lenient;
    let root = config.output_root.clone();
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("arcade"), "not a directory").unwrap();
    let report = run(config);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, "invalid_output_path");
    assert!(report.failures[0].error.contains("arcade"));
}

#[test]
fn strict_error_names_missing_field() {
    let (_dir, config) = setup("name,cate\nPong,arcade\n");
    let err = CsvProcessor::new(config).run().unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("Line 2"), "{message}");
    assert!(message.contains("missing required field `title`"), "{message}");
}

#[test]
fn strict_error_names_multiline_header_field() {
    let (_dir, config) = setup("title,cover\nPong,\"a\nb\"\n");
    let err = CsvProcessor::new(config).run().unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("field `cover`"), "{message}");
}

#[test]
fn case_only_collisions_are_flagged() {
    let (_dir, config) = setup("title,cate,filename\nPong,arcade,\nPong,Arcade,\nPong,arcade,Pong\n");
    let report = run(config);

    assert!(report.is_success());
    assert_eq!(report.collisions.len(), 2);
    assert!(report.collisions.iter().all(|c| c.case_only));
    assert_eq!(report.collisions[0].first_line, 2);
    assert_eq!(report.collisions[0].line, 3);
    assert_eq!(report.collisions[1].line, 4);
}
