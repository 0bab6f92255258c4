//! Load a workspace from disk, move a file, commit the staged changes back

use pretty_assertions::assert_eq;
use reloc_foundation::InMemoryTree;
use reloc_lang_typescript::tsconfig::{apply_tsconfig_aliases, TSCONFIG_BASE};
use reloc_services::services::ImportScanGraphSource;
use reloc_services::{MoveOptions, MoveRequest, MoveService, MoveStrategy};
use reloc_test_support::{typescript_parser, TestWorkspace, WorkspaceFixture};

fn seed(disk: &TestWorkspace) {
    disk.create_tsconfig_base(&[
        ("@org/lib-a", "libs/lib-a/src/index.ts"),
        ("@org/lib-b", "libs/lib-b/src/index.ts"),
    ]);
    disk.create_file("libs/lib-a/src/index.ts", "export * from './lib/consumer';\n");
    disk.create_file(
        "libs/lib-a/src/lib/consumer.ts",
        "import { helper } from './helper';\n\nexport const consume = () => helper();\n",
    );
    disk.create_file(
        "libs/lib-a/src/lib/helper.ts",
        "export const helper = () => 'help';\n",
    );
    disk.create_file("libs/lib-b/src/index.ts", "export {};\n");
}

#[test]
fn test_move_commits_to_disk() {
    let disk = TestWorkspace::new();
    seed(&disk);

    let (mut workspace, _) = WorkspaceFixture::new()
        .library("lib-a", "libs/lib-a", None)
        .library("lib-b", "libs/lib-b", None)
        .build();
    let published = apply_tsconfig_aliases(&mut workspace, &disk.read_file(TSCONFIG_BASE)).unwrap();
    assert_eq!(published, 2);

    let mut tree = InMemoryTree::load_from_disk(disk.path()).unwrap();
    let graph = ImportScanGraphSource;
    let report = MoveService::new(&workspace, typescript_parser(), &graph)
        .move_file(
            &mut tree,
            &MoveRequest::new("libs/lib-a/src/lib/helper.ts", "libs/lib-b/src/lib/helper.ts"),
            &MoveOptions::default(),
        )
        .unwrap();
    assert_eq!(report.strategy, MoveStrategy::NonExportedAliased);

    // Nothing reaches the disk before the commit.
    assert!(disk.file_exists("libs/lib-a/src/lib/helper.ts"));
    assert!(!disk.file_exists("libs/lib-b/src/lib/helper.ts"));

    let applied = tree.commit_to_disk(disk.path()).unwrap();
    assert_eq!(applied, 4);

    assert!(!disk.file_exists("libs/lib-a/src/lib/helper.ts"));
    assert_eq!(
        disk.read_file("libs/lib-b/src/lib/helper.ts"),
        "export const helper = () => 'help';\n"
    );
    assert_eq!(
        disk.read_file("libs/lib-a/src/lib/consumer.ts"),
        "import { helper } from '@org/lib-b';\n\nexport const consume = () => helper();\n"
    );
    assert_eq!(
        disk.read_file("libs/lib-b/src/index.ts"),
        "export {};\nexport * from './lib/helper';\n"
    );
}
