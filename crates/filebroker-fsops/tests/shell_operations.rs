use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use filebroker_fsops::{
    ApartmentWorker, FailureCode, FsOpsError, ItemOperation, LocalShellEngine, OperationKind,
    OperationOptions, ShellOperations, StagingRecycleBin,
};
use filebroker_test_support::TempTree;

fn operations(tree: &TempTree) -> Result<ShellOperations> {
    let bin = Arc::new(StagingRecycleBin::new(tree.join("recycle")));
    let engine = Arc::new(LocalShellEngine::new(bin));
    let worker = ApartmentWorker::spawn("shell-test")?;
    Ok(ShellOperations::new(worker, engine))
}

#[tokio::test]
async fn delete_recycles_unless_permanent() -> Result<()> {
    let tree = TempTree::new()?;
    let ops = operations(&tree)?;
    let soft = tree.write_file("soft.txt", "s")?;
    let hard = tree.write_file("hard.txt", "h")?;

    assert!(ops.delete(&soft, false).await);
    assert!(ops.delete(&hard, true).await);

    assert_eq!(tree.list("recycle")?, vec!["soft.txt".to_string()]);
    assert!(!soft.exists());
    assert!(!hard.exists());
    Ok(())
}

#[tokio::test]
async fn delete_of_missing_item_reports_failure() -> Result<()> {
    let tree = TempTree::new()?;
    let ops = operations(&tree)?;
    assert!(!ops.delete(&tree.join("absent.txt"), false).await);
    Ok(())
}

#[tokio::test]
async fn rename_move_and_copy_respect_overwrite() -> Result<()> {
    let tree = TempTree::new()?;
    let ops = operations(&tree)?;

    let draft = tree.write_file("work/draft.txt", "draft")?;
    tree.write_file("work/final.txt", "taken")?;
    assert!(ops.rename(&draft, "final", false).await);
    assert_eq!(tree.read_to_string("work/final (2).txt")?, "draft");

    let moving = tree.write_file("work/move.txt", "moved")?;
    tree.write_file("out/move.txt", "old")?;
    assert!(ops.move_item(&moving, &tree.join("out/move.txt"), true).await);
    assert_eq!(tree.read_to_string("out/move.txt")?, "moved");
    assert!(!moving.exists());

    let copying = tree.write_file("work/copy.txt", "copied")?;
    assert!(ops.copy(&copying, &tree.join("out/move.txt"), false).await);
    assert_eq!(tree.read_to_string("out/move (2).txt")?, "copied");
    assert!(copying.exists());
    Ok(())
}

#[tokio::test]
async fn overwrite_onto_an_alias_of_the_source_keeps_it() -> Result<()> {
    let tree = TempTree::new()?;
    let ops = operations(&tree)?;
    let source = tree.write_file("a.txt", "precious")?;
    tree.create_dir("sub")?;

    assert!(ops.copy(&source, &tree.join("sub/../a.txt"), true).await);
    assert!(ops.move_item(&source, &tree.join("sub/../a.txt"), true).await);

    assert_eq!(tree.read_to_string("a.txt")?, "precious");
    assert_eq!(tree.read_to_string("a (2).txt")?, "precious");
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn overwrite_through_symlinked_folder_keeps_source() -> Result<()> {
    let tree = TempTree::new()?;
    let ops = operations(&tree)?;
    let source = tree.write_file("real/a.txt", "precious")?;
    std::os::unix::fs::symlink(tree.join("real"), tree.join("alias"))?;

    assert!(ops.move_item(&source, &tree.join("alias/a.txt"), true).await);

    assert_eq!(tree.read_to_string("real/a.txt")?, "precious");
    Ok(())
}

#[tokio::test]
async fn overwrite_keeps_folder_contents_when_kinds_differ() -> Result<()> {
    let tree = TempTree::new()?;
    let ops = operations(&tree)?;
    let report = tree.write_file("report", "file")?;
    tree.write_file("out/report/important/1.txt", "keep")?;

    assert!(!ops.copy(&report, &tree.join("out/report"), true).await);
    assert!(!ops.move_item(&report, &tree.join("out/report"), true).await);

    assert_eq!(tree.read_to_string("out/report/important/1.txt")?, "keep");
    assert!(report.exists());
    Ok(())
}

#[tokio::test]
async fn perform_many_reports_each_item() -> Result<()> {
    let tree = TempTree::new()?;
    let ops = operations(&tree)?;
    let present = tree.write_file("a.txt", "a")?;
    let items = vec![
        ItemOperation::Delete { source: present },
        ItemOperation::Delete { source: tree.join("missing.txt") },
    ];

    let outcome = ops
        .perform_many(OperationKind::Delete, OperationOptions::for_delete(true), items)
        .await?;

    assert!(!outcome.success);
    assert_eq!(outcome.events.len(), 2);
    assert!(outcome.events[0].succeeded());
    assert_eq!(outcome.events[1].result, Err(FailureCode::NotFound));
    Ok(())
}

#[tokio::test]
async fn perform_many_rejects_mixed_kinds() -> Result<()> {
    let tree = TempTree::new()?;
    let ops = operations(&tree)?;
    let items = vec![ItemOperation::Rename {
        source: PathBuf::from("/a"),
        new_name: "b".to_string(),
    }];
    let err = ops
        .perform_many(OperationKind::Delete, OperationOptions::default(), items)
        .await
        .expect_err("mixed kinds");
    assert!(matches!(err, FsOpsError::KindMismatch { .. }));
    Ok(())
}
