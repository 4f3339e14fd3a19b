use std::fs;

use docfinder_engine::{
    load_preview, probe_folders, BridgeError, CapabilityBridge, DirEntry, FileContent, FileHead,
    LocalFsBridge, PickerCommand, TRUNCATED_MARKER,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn path_str(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn read_directory_lists_sorted_entries() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("b.txt"), "b").unwrap();
    fs::write(temp.path().join("a.txt"), "a").unwrap();
    fs::create_dir(temp.path().join("nested")).unwrap();

    let bridge = LocalFsBridge::default();
    let entries = bridge
        .read_directory(&path_str(temp.path()))
        .await
        .unwrap();
    assert_eq!(
        entries,
        vec![
            DirEntry {
                name: "a.txt".to_string(),
                is_directory: false
            },
            DirEntry {
                name: "b.txt".to_string(),
                is_directory: false
            },
            DirEntry {
                name: "nested".to_string(),
                is_directory: true
            },
        ]
    );
}

#[tokio::test]
async fn read_directory_reports_typed_errors() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("plain.txt");
    fs::write(&file, "x").unwrap();
    let missing = temp.path().join("missing");

    let bridge = LocalFsBridge::default();
    assert_eq!(
        bridge.read_directory(&path_str(&file)).await,
        Err(BridgeError::NotADirectory(path_str(&file)))
    );
    assert_eq!(
        bridge.read_directory(&path_str(&missing)).await,
        Err(BridgeError::NotFound(path_str(&missing)))
    );
}

#[tokio::test]
async fn probe_stops_at_first_unreadable_path() {
    let temp = TempDir::new().unwrap();
    let good = temp.path().join("good");
    fs::create_dir(&good).unwrap();
    let bad = temp.path().join("bad");

    let bridge = LocalFsBridge::default();
    let failure = probe_folders(&bridge, &[path_str(&good), path_str(&bad)])
        .await
        .unwrap_err();
    assert_eq!(failure.path, path_str(&bad));
    assert!(failure.message.contains("no such file"));

    assert!(probe_folders(&bridge, &[path_str(&good)]).await.is_ok());
}

#[tokio::test]
async fn read_file_separates_text_from_binary() {
    let temp = TempDir::new().unwrap();
    let text = temp.path().join("notes.txt");
    fs::write(&text, "hello").unwrap();
    let binary = temp.path().join("blob.bin");
    fs::write(&binary, [0x00, 0xFF, 0xFE, 0x80]).unwrap();

    let bridge = LocalFsBridge::default();
    assert_eq!(
        bridge.read_file(&path_str(&text)).await,
        Ok(FileContent::Text("hello".to_string()))
    );
    assert_eq!(
        bridge.read_file(&path_str(&binary)).await,
        Ok(FileContent::Binary(vec![0x00, 0xFF, 0xFE, 0x80]))
    );
    assert_eq!(
        bridge.read_file(&path_str(temp.path())).await,
        Err(BridgeError::IsADirectory(path_str(temp.path())))
    );
}

#[tokio::test]
async fn data_url_is_base64_with_mime() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("hi.txt");
    fs::write(&file, "hi").unwrap();

    let bridge = LocalFsBridge::default();
    let url = bridge.read_file_as_data_url(&path_str(&file)).await.unwrap();
    assert_eq!(url, "data:text/plain;base64,aGk=");
}

#[tokio::test]
async fn stats_describe_files_and_directories() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("five.txt");
    fs::write(&file, "12345").unwrap();

    let bridge = LocalFsBridge::default();
    let stats = bridge.get_stats(&path_str(&file)).await.unwrap();
    assert!(stats.is_file);
    assert!(!stats.is_directory);
    assert_eq!(stats.size, 5);
    assert!(stats.modified.is_some());

    let dir_stats = bridge.get_stats(&path_str(temp.path())).await.unwrap();
    assert!(dir_stats.is_directory);
}

#[tokio::test]
async fn preview_truncates_and_rejects_directories() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("long.txt");
    fs::write(&file, "x".repeat(64)).unwrap();
    let binary = temp.path().join("image.bin");
    fs::write(&binary, [0xC3, 0x28]).unwrap();

    let bridge = LocalFsBridge::default();
    let body = load_preview(&bridge, &path_str(&file), 16).await.unwrap();
    assert!(body.truncated);
    assert_eq!(
        body.content,
        Some(format!("{}{TRUNCATED_MARKER}", "x".repeat(16)))
    );

    let body = load_preview(&bridge, &path_str(&binary), 16).await.unwrap();
    assert_eq!(body.content, None);

    let err = load_preview(&bridge, &path_str(temp.path()), 16)
        .await
        .unwrap_err();
    assert_eq!(err, BridgeError::IsADirectory(path_str(temp.path())));
}

#[tokio::test]
async fn preview_of_large_file_reads_only_its_head() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("huge.log");
    let mut bytes = vec![b'a'; 2 * 1024 * 1024];
    bytes.push(0xFF);
    fs::write(&file, bytes).unwrap();

    let bridge = LocalFsBridge::default();
    let body = load_preview(&bridge, &path_str(&file), 1024).await.unwrap();
    assert!(body.truncated);
    assert_eq!(
        body.content,
        Some(format!("{}{TRUNCATED_MARKER}", "a".repeat(1024)))
    );
}

#[tokio::test]
async fn preview_drops_character_split_by_the_limit() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("accents.txt");
    fs::write(&file, "é".repeat(10)).unwrap();

    let bridge = LocalFsBridge::default();
    let body = load_preview(&bridge, &path_str(&file), 5).await.unwrap();
    assert!(body.truncated);
    assert_eq!(body.content, Some(format!("éé{TRUNCATED_MARKER}")));
}

#[tokio::test]
async fn file_head_stops_at_the_limit() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("hello.txt");
    fs::write(&file, "hello world").unwrap();

    let bridge = LocalFsBridge::default();
    assert_eq!(
        bridge.read_file_head(&path_str(&file), 5).await,
        Ok(FileHead {
            bytes: b"hello".to_vec(),
            complete: false,
        })
    );
    assert_eq!(
        bridge.read_file_head(&path_str(&file), 11).await,
        Ok(FileHead {
            bytes: b"hello world".to_vec(),
            complete: true,
        })
    );
    assert_eq!(
        bridge.read_file_head(&path_str(temp.path()), 5).await,
        Err(BridgeError::IsADirectory(path_str(temp.path())))
    );
}

#[tokio::test]
async fn directory_picker_requires_configuration() {
    let bridge = LocalFsBridge::default();
    assert!(matches!(
        bridge.open_directory().await,
        Err(BridgeError::Unsupported(_))
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn directory_picker_reads_one_path_per_line() {
    let bridge = LocalFsBridge::new(Some(PickerCommand {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), "printf '/a\\n/b c\\n\\n'".to_string()],
    }));
    assert_eq!(
        bridge.open_directory().await,
        Ok(vec!["/a".to_string(), "/b c".to_string()])
    );

    let dismissed = LocalFsBridge::new(Some(PickerCommand {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), "exit 1".to_string()],
    }));
    assert_eq!(dismissed.open_directory().await, Ok(Vec::new()));
}
