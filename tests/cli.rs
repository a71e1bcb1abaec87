use assert_cmd::Command;
use predicates::prelude::*;

fn kopilka(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("kopilka").unwrap();
    cmd.env("HOME", home);
    cmd
}

#[test]
fn test_init_import_and_list() {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("data");

    kopilka(home.path())
        .arg("init")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    let csv = home.path().join("statement.csv");
    std::fs::write(
        &csv,
        "Дата;Описание;Сумма;Валюта\n\
         01.06.2024;Supermarket XYZ;-1250.50;RUB\n\
         02.06.2024;Зарплата за май;75000,00;RUB\n",
    )
    .unwrap();

    kopilka(home.path())
        .arg("import")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 imported"));

    kopilka(home.path())
        .arg("transactions")
        .assert()
        .success()
        .stdout(predicate::str::contains("Supermarket XYZ"));
}

#[test]
fn test_reimport_is_not_deduplicated() {
    let home = tempfile::tempdir().unwrap();
    kopilka(home.path())
        .arg("init")
        .arg("--data-dir")
        .arg(home.path().join("data"))
        .assert()
        .success();

    let csv = home.path().join("statement.csv");
    std::fs::write(&csv, "01.06.2024;Кафе;-300,00;RUB\n").unwrap();

    for _ in 0..2 {
        kopilka(home.path())
            .arg("import")
            .arg(&csv)
            .assert()
            .success()
            .stdout(predicate::str::contains("1 imported"));
    }
}

#[test]
fn test_import_missing_file_fails() {
    let home = tempfile::tempdir().unwrap();
    kopilka(home.path())
        .arg("init")
        .arg("--data-dir")
        .arg(home.path().join("data"))
        .assert()
        .success();

    kopilka(home.path())
        .arg("import")
        .arg("/no/such/file.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot open file"));
}

#[test]
fn test_unknown_format_key_fails() {
    let home = tempfile::tempdir().unwrap();
    kopilka(home.path())
        .arg("init")
        .arg("--data-dir")
        .arg(home.path().join("data"))
        .assert()
        .success();

    let csv = home.path().join("statement.csv");
    std::fs::write(&csv, "01.06.2024;Кафе;-300,00;RUB\n").unwrap();

    kopilka(home.path())
        .arg("import")
        .arg(&csv)
        .arg("--format")
        .arg("monopoly-bank")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown statement format"));
}
