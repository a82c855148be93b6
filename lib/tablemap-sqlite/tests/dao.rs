//! Runs every Dao operation against an in-memory SQLite database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tablemap_sqlite::{Connect, Dao, Entity, Page, SqlitePool};

#[derive(Debug, Clone, Default, PartialEq, Entity, Serialize, Deserialize)]
#[entity(table = "clients")]
struct Client {
    #[primary_key]
    id: Option<i64>,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Entity, Serialize, Deserialize)]
#[entity(table = "commandes")]
struct Commande {
    #[primary_key]
    id: Option<i64>,
    #[column(name = "date_commande")]
    date: Option<NaiveDate>,
    montant: Option<f64>,
    livree: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Entity, Serialize, Deserialize)]
#[entity(table = "evenements")]
struct Evenement {
    #[primary_key]
    id: Option<i64>,
    titre: String,
    debut: NaiveDateTime,
    publie_le: Option<DateTime<Utc>>,
    tags: Vec<String>,
    score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Adresse {
    ville: String,
    code: String,
}

#[derive(Debug, Clone, PartialEq, Entity, Serialize, Deserialize)]
#[entity(table = "personnes")]
struct Personne {
    #[primary_key]
    id: Option<i64>,
    nom: String,
    adresse: Option<Adresse>,
}

#[derive(Debug, Clone, PartialEq, Entity, Serialize, Deserialize)]
#[entity(table = "personnes")]
struct PersonneJson {
    #[primary_key]
    id: Option<i64>,
    nom: String,
    #[column(kind = "json")]
    adresse: Option<Adresse>,
}

#[derive(Debug, Clone, Entity, Serialize, Deserialize)]
#[entity(table = "journal_absent")]
struct Journal {
    line: String,
}

async fn dao() -> Dao<SqlitePool> {
    let dao = Dao::new(SqlitePool::connect("sqlite::memory:").await.expect("connect"));
    dao.execute(
        "CREATE TABLE clients (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             name TEXT,
             email TEXT
         );
         CREATE TABLE commandes (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             date_commande DATE,
             montant REAL,
             livree BOOLEAN
         );
         CREATE TABLE evenements (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             titre TEXT NOT NULL,
             debut TIMESTAMP NOT NULL,
             publie_le TIMESTAMPTZ,
             tags TEXT NOT NULL,
             score REAL NOT NULL
         );
         CREATE TABLE personnes (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             nom TEXT NOT NULL,
             adresse TEXT
         );",
    )
    .await
    .expect("schema");
    dao
}

fn client(name: &str, email: &str) -> Client {
    Client {
        id: None,
        name: Some(name.to_string()),
        email: Some(email.to_string()),
    }
}

fn day(d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2023, 1, d)
}

async fn seed_clients(dao: &Dao<SqlitePool>) {
    for (name, email) in [
        ("Jean", "jean@example.com"),
        ("O'Brien", "obrien@example.com"),
        ("Ana", "ana@example.com"),
    ] {
        assert_eq!(dao.insert(&client(name, email)).await.unwrap(), 1);
    }
}

async fn seed_commandes(dao: &Dao<SqlitePool>) {
    for (d, montant, livree) in [(1, 10.0, true), (15, 20.5, false), (28, 30.0, true)] {
        let commande = Commande {
            id: None,
            date: day(d),
            montant: Some(montant),
            livree: Some(livree),
        };
        assert_eq!(dao.insert(&commande).await.unwrap(), 1);
    }
}

#[tokio::test]
async fn insert_then_find_all_assigns_keys() {
    let dao = dao().await;
    seed_clients(&dao).await;

    let all: Vec<Client> = dao.find_all().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(
        all.iter().map(|c| c.id.unwrap()).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    // Quotes survive the round trip untouched
    assert_eq!(all[1].name.as_deref(), Some("O'Brien"));
}

#[tokio::test]
async fn criteria_matches_any_given_field() {
    let dao = dao().await;
    seed_clients(&dao).await;

    let template = Client {
        name: Some("Jean".to_string()),
        email: Some("ana@example.com".to_string()),
        ..Default::default()
    };
    let found = dao.find_by_criteria(&template).await.unwrap();
    let names: Vec<_> = found.iter().filter_map(|c| c.name.as_deref()).collect();
    assert_eq!(names, vec!["Jean", "Ana"]);

    let quoted = Client {
        name: Some("O'Brien".to_string()),
        ..Default::default()
    };
    assert_eq!(dao.find_by_criteria(&quoted).await.unwrap().len(), 1);

    // No values: whole table
    let everything = dao.find_by_criteria(&Client::default()).await.unwrap();
    assert_eq!(everything.len(), 3);
}

#[tokio::test]
async fn pages_are_one_based() {
    let dao = dao().await;
    seed_clients(&dao).await;

    let first: Vec<Client> = dao.find_all_paged(Page::new(1, 2)).await.unwrap();
    let second: Vec<Client> = dao.find_all_paged(Page::new(2, 2)).await.unwrap();
    let third: Vec<Client> = dao.find_all_paged(Page::new(3, 2)).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 1);
    assert!(third.is_empty());
    assert_eq!(second[0].name.as_deref(), Some("Ana"));

    let paged = dao
        .find_by_criteria_paged(&Client::default(), Page::new(1, 1))
        .await
        .unwrap();
    assert_eq!(paged.len(), 1);
}

#[tokio::test]
async fn interval_filters_on_named_column() {
    let dao = dao().await;
    seed_commandes(&dao).await;

    let lower = Commande {
        date: day(10),
        ..Default::default()
    };
    let upper = Commande {
        date: day(31),
        ..Default::default()
    };

    let ranged = dao.find_by_interval(&lower, &upper).await.unwrap();
    assert_eq!(ranged.len(), 2);
    assert_eq!(ranged[0].date, day(15));
    assert_eq!(ranged[0].livree, Some(false));
    assert_eq!(ranged[1].montant, Some(30.0));

    let paged = dao
        .find_by_interval_paged(&lower, &upper, Page::new(2, 1))
        .await
        .unwrap();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].date, day(28));

    let none = dao
        .find_by_interval(&Commande::default(), &Commande::default())
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn update_and_delete_by_key() {
    let dao = dao().await;
    seed_clients(&dao).await;

    let mut jean = dao
        .find_by_criteria(&Client {
            name: Some("Jean".to_string()),
            ..Default::default()
        })
        .await
        .unwrap()
        .remove(0);
    jean.email = None;
    assert_eq!(dao.update(&jean).await.unwrap(), 1);

    let reread: Vec<Client> = dao.find("SELECT * FROM clients WHERE id = 1").await.unwrap();
    assert_eq!(reread, vec![jean.clone()]);

    assert_eq!(dao.delete(&jean).await.unwrap(), 1);
    // Deleting again affects nothing
    assert_eq!(dao.delete(&jean).await.unwrap(), 0);

    let rest: Vec<Client> = dao.find_all().await.unwrap();
    assert_eq!(rest.len(), 2);
}

#[tokio::test]
async fn writes_without_a_key_never_reach_the_database() {
    let dao = dao().await;

    // The table does not exist, so an issued statement would be a storage error
    let err = dao
        .insert(&Journal {
            line: "x".to_string(),
        })
        .await
        .unwrap_err();
    assert!(err.is_configuration());

    let err = dao.update(&client("Jean", "jean@example.com")).await.unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn missing_column_is_a_mapping_error() {
    let dao = dao().await;
    seed_clients(&dao).await;

    let err = dao
        .find::<Client>("SELECT id, name FROM clients")
        .await
        .unwrap_err();
    assert!(err.is_mapping());
}

#[tokio::test]
async fn database_failures_are_storage_errors() {
    let dao = dao().await;

    let err = dao.find_all::<Journal>().await.unwrap_err();
    assert!(err.is_storage());

    let err = dao.execute("NOT VALID SQL").await.unwrap_err();
    assert!(err.is_storage());
}

#[tokio::test]
async fn raw_execute_reports_affected_rows() {
    let dao = dao().await;
    seed_commandes(&dao).await;

    let affected = dao
        .execute("UPDATE commandes SET livree = 1 WHERE livree = 0")
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let delivered = dao
        .find_by_criteria(&Commande {
            livree: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(delivered.len(), 3);
}

fn at(d: u32, h: u32, m: u32, sec: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, d)
        .unwrap()
        .and_hms_opt(h, m, sec)
        .unwrap()
}

#[tokio::test]
async fn insert_then_find_all_reproduces_every_field() {
    let dao = dao().await;

    let inserted = vec![
        Evenement {
            id: None,
            titre: "Lancement d'été".to_string(),
            debut: at(12, 18, 30, 5),
            publie_le: Some(at(1, 9, 0, 0).and_utc()),
            tags: vec!["public".to_string(), "gratuit".to_string()],
            score: 4.75,
        },
        Evenement {
            id: None,
            titre: "Atelier".to_string(),
            debut: at(20, 14, 0, 0),
            publie_le: None,
            tags: Vec::new(),
            score: -1.5,
        },
    ];
    for evenement in &inserted {
        assert_eq!(dao.insert(evenement).await.unwrap(), 1);
    }

    let read: Vec<Evenement> = dao.find_all().await.unwrap();
    assert_eq!(read.len(), inserted.len());
    for (row, expected) in read.into_iter().zip(&inserted) {
        assert!(row.id.is_some());
        let without_key = Evenement { id: None, ..row };
        assert_eq!(&without_key, expected);
    }

    let tagged = dao
        .find_by_criteria(&Evenement {
            id: None,
            titre: "Atelier".to_string(),
            debut: at(1, 0, 0, 0),
            publie_le: None,
            tags: vec!["absent".to_string()],
            score: 0.0,
        })
        .await
        .unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].titre, "Atelier");
}

#[tokio::test]
async fn nested_struct_needs_a_json_column() {
    let dao = dao().await;

    let lyon = Some(Adresse {
        ville: "Lyon".to_string(),
        code: "69001".to_string(),
    });

    // Without a json kind the write is refused rather than stored unreadable
    let err = dao
        .insert(&Personne {
            id: None,
            nom: "Jean".to_string(),
            adresse: lyon.clone(),
        })
        .await
        .unwrap_err();
    assert!(err.is_mapping());
    let nobody: Vec<PersonneJson> = dao.find_all().await.unwrap();
    assert!(nobody.is_empty());

    let personne = PersonneJson {
        id: None,
        nom: "Jean".to_string(),
        adresse: lyon,
    };
    assert_eq!(dao.insert(&personne).await.unwrap(), 1);
    assert_eq!(
        dao.insert(&PersonneJson {
            id: None,
            nom: "Ana".to_string(),
            adresse: None,
        })
        .await
        .unwrap(),
        1
    );

    let read: Vec<PersonneJson> = dao.find_all().await.unwrap();
    assert_eq!(read.len(), 2);
    assert_eq!(read[0].adresse, personne.adresse);
    assert_eq!(read[1].adresse, None);
}
