//! Patient-records service client

use crate::client::HttpService;
use crate::error::{ClientError, Result};
use crate::types::{NewPatient, Patient, ServiceConfig};

/// CRUD client for the patient-records service
#[derive(Debug, Clone)]
pub struct RecordsClient {
    service: HttpService,
}

impl RecordsClient {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        Ok(Self {
            service: HttpService::new(config)?,
        })
    }

    /// List all patients
    pub async fn list_patients(&self) -> Result<Vec<Patient>> {
        self.service.get_json("patients").await
    }

    /// Get a patient by ID, `None` if the service does not know it
    pub async fn get_patient(&self, id: &str) -> Result<Option<Patient>> {
        let path = format!("patients/{}", urlencoding::encode(id));
        match self.service.get_json(&path).await {
            Ok(patient) => Ok(Some(patient)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a patient record
    pub async fn create_patient(&self, input: &NewPatient) -> Result<Patient> {
        if input.patient_name.trim().is_empty() {
            return Err(ClientError::InvalidRequest("patient name is required".into()));
        }
        self.service.post_json("patient", input).await
    }

    /// Delete a patient record
    pub async fn delete_patient(&self, id: &str) -> Result<bool> {
        let path = format!("patients/{}", urlencoding::encode(id));
        self.service.delete(&path).await
    }
}
