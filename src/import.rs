//! Batch CSV import of the lending dataset.
//!
//! Each CSV row becomes one client plus its meta, situation and contract rows. All rows go
//! in through the same coercion and INSERT path as the HTTP API, inside a single transaction.

use crate::config::ResolvedModel;
use crate::error::AppError;
use crate::service::{ensure_required, preprocess, CrudService};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {line}: {source}")]
    Row {
        line: u64,
        #[source]
        source: AppError,
    },
    #[error(transparent)]
    App(#[from] AppError),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

/// One line of the dataset, with the column names used by the source file.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvRow {
    pub nom: String,
    pub prenom: String,
    pub age: i32,
    pub taille: f64,
    pub poids: f64,
    pub sexe: String,
    pub sport_licence: String,
    pub niveau_etude: String,
    pub region: String,
    pub smoker: String,
    #[serde(rename = "nationalité_francaise", alias = "nationalite_francaise")]
    pub nationalite_francaise: String,
    pub situation_familiale: Option<String>,
    pub revenu_estime_mois: i32,
    pub historique_credits: Option<f64>,
    pub risque_personnel: f64,
    pub score_credit: Option<f64>,
    pub loyer_mensuel: Option<f64>,
    pub montant_pret: f64,
    pub date_creation_compte: String,
}

/// `"oui"` is true, anything else is false.
pub fn oui(s: &str) -> bool {
    s.trim() == "oui"
}

fn object(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => Map::new(),
    }
}

impl CsvRow {
    pub fn client(&self) -> Map<String, Value> {
        object(json!({
            "nom": self.nom,
            "prenom": self.prenom,
            "date_creation_compte": self.date_creation_compte,
        }))
    }

    pub fn meta(&self, client_id: i64) -> Map<String, Value> {
        object(json!({
            "client_id": client_id,
            "age": self.age,
            "taille": self.taille,
            "poids": self.poids,
            "sexe": self.sexe,
            "sport_licence": oui(&self.sport_licence),
            "niveau_etude": self.niveau_etude,
            "region": self.region,
            "smoker": oui(&self.smoker),
            "nationalite_francaise": oui(&self.nationalite_francaise),
            "situation_familiale": self.situation_familiale,
        }))
    }

    pub fn situation(&self, client_id: i64) -> Map<String, Value> {
        object(json!({
            "client_id": client_id,
            "revenu_estime_mois": self.revenu_estime_mois,
            "historique_credits": self.historique_credits,
            "risque_personnel": self.risque_personnel,
            "score_credit": self.score_credit,
            "loyer_mensuel": self.loyer_mensuel,
        }))
    }

    pub fn contrat(&self, client_id: i64) -> Map<String, Value> {
        object(json!({
            "client_id": client_id,
            "montant_pret": self.montant_pret,
        }))
    }
}

/// Parse every row of the file. Fails on the first malformed row.
pub fn read_rows(path: &Path) -> Result<Vec<(u64, CsvRow)>, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ImportError::FileNotFound(path.to_path_buf()),
        _ => ImportError::Io(e),
    })?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let headers = reader.headers()?.clone();
    let mut record = csv::StringRecord::new();
    let mut rows = Vec::new();
    while reader.read_record(&mut record)? {
        let row: CsvRow = record.deserialize(Some(&headers))?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        rows.push((line, row));
    }
    Ok(rows)
}

/// Import the CSV at `path`. Returns the number of clients inserted; on error nothing is kept.
pub async fn import_csv(pool: &PgPool, model: &ResolvedModel, path: &Path) -> Result<u64, ImportError> {
    tracing::info!(path = %path.display(), "reading csv");
    let rows = read_rows(path)?;
    tracing::info!(rows = rows.len(), "rows found, inserting");

    let clients = model.entity("clients")?;
    let meta = model.entity("client_meta")?;
    let situation = model.entity("client_situation")?;
    let contrats = model.entity("contrats")?;

    let mut tx = pool.begin().await?;
    let mut count = 0u64;
    for (line, row) in &rows {
        let line = *line;
        let inserted: Result<(), ImportError> = async {
            let values = preprocess(clients, row.client()).map_err(|source| ImportError::Row { line, source })?;
            ensure_required(clients, &values).map_err(|source| ImportError::Row { line, source })?;
            let client = CrudService::insert_values(&mut tx, clients, &values).await?;
            let client_id = client["id"].as_i64().ok_or_else(|| ImportError::Row {
                line,
                source: AppError::ServerError("insert returned no id".into()),
            })?;
            for (entity, data) in [
                (meta, row.meta(client_id)),
                (situation, row.situation(client_id)),
                (contrats, row.contrat(client_id)),
            ] {
                let values = preprocess(entity, data).map_err(|source| ImportError::Row { line, source })?;
                CrudService::insert_values(&mut tx, entity, &values).await?;
            }
            Ok(())
        }
        .await;
        if let Err(e) = inserted {
            tracing::error!(line, error = %e, "import failed, rolling back");
            if let Err(rb) = tx.rollback().await {
                tracing::warn!(error = %rb, "rollback failed");
            }
            return Err(e);
        }
        count += 1;
    }
    tx.commit().await?;
    tracing::info!(count, "clients imported");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_model, resolve};
    use std::io::Write;

    const HEADER: &str = "nom,prenom,age,taille,poids,sexe,sport_licence,niveau_etude,region,smoker,nationalité_francaise,situation_familiale,revenu_estime_mois,historique_credits,risque_personnel,score_credit,loyer_mensuel,montant_pret,date_creation_compte";

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "{}", HEADER).unwrap();
        for l in lines {
            writeln!(f, "{}", l).unwrap();
        }
        f
    }

    #[test]
    fn oui_is_the_only_true() {
        assert!(oui("oui"));
        assert!(!oui("non"));
        assert!(!oui("Oui"));
        assert!(!oui(""));
    }

    #[test]
    fn rows_parse_with_empty_cells_as_null() {
        let f = csv_file(&[
            "Martin,Jean,42,178.5,80.2,H,oui,master,Bretagne,non,oui,,3200,,0.3,,750.0,15000,2021-03-04",
        ]);
        let rows = read_rows(f.path()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0].1;
        assert_eq!(row.nom, "Martin");
        assert!(row.situation_familiale.is_none());
        assert!(row.historique_credits.is_none());
        assert_eq!(row.loyer_mensuel, Some(750.0));

        let meta = row.meta(9);
        assert_eq!(meta["sport_licence"], json!(true));
        assert_eq!(meta["smoker"], json!(false));
        assert_eq!(meta["nationalite_francaise"], json!(true));
        assert_eq!(meta["situation_familiale"], Value::Null);
        assert_eq!(meta["client_id"], json!(9));
    }

    #[test]
    fn mapped_rows_pass_preprocessing() {
        let f = csv_file(&[
            "Durand,Marie,35,165,60,F,non,bac,Occitanie,oui,oui,mariée,2500,1.0,0.6,710.5,,8000,2019-11-30",
        ]);
        let row = read_rows(f.path()).unwrap().remove(0).1;
        let model = resolve(&builtin_model().unwrap()).unwrap();
        let clients = model.entity("clients").unwrap();
        let values = preprocess(clients, row.client()).unwrap();
        ensure_required(clients, &values).unwrap();
        preprocess(model.entity("client_meta").unwrap(), row.meta(1)).unwrap();
        preprocess(model.entity("client_situation").unwrap(), row.situation(1)).unwrap();
        preprocess(model.entity("contrats").unwrap(), row.contrat(1)).unwrap();
    }

    #[test]
    fn missing_file_is_reported() {
        let err = read_rows(Path::new("/nonexistent/dataset.csv")).unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));
    }

    #[test]
    fn malformed_row_is_a_csv_error() {
        let f = csv_file(&["Martin,Jean,quarante,178.5,80.2,H,oui,master,Bretagne,non,oui,,3200,,0.3,,,15000,2021-03-04"]);
        assert!(matches!(read_rows(f.path()), Err(ImportError::Csv(_))));
    }
}
