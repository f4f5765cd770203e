//! Course operations: course lists, field templates, invitations and FAQ
//! import/export.

use crate::error::AppError;
use crate::models::{
    Course, InvitationResponse, InvitedInfo, JoinRequest, MyCourse, NewInvitation, Role,
    SuccessResponse, TicketField,
};
use crate::services::api_client::ApiClient;
use crate::services::endpoints;
use crate::services::error_handler::ErrorHandler;
use crate::services::store::Store;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Deserialize)]
struct CourseInfo {
    #[serde(rename = "nimi")]
    name: String,
}

#[derive(Serialize)]
struct FieldTemplateBody<'a> {
    #[serde(rename = "kentat")]
    fields: &'a [TicketField],
}

pub struct CourseService {
    api: Arc<ApiClient>,
    store: Arc<Store>,
    errors: Arc<ErrorHandler>,
}

impl CourseService {
    pub fn new(api: Arc<ApiClient>, store: Arc<Store>, errors: Arc<ErrorHandler>) -> Self {
        Self { api, store, errors }
    }

    /// All courses. A successful answer proves the session is logged in.
    pub async fn get_courses(&self) -> Result<Vec<Course>, AppError> {
        let courses = self
            .api
            .get(&endpoints::courses())
            .await
            .map_err(|e| self.errors.report(e))?;
        self.store.set_logged_in();
        Ok(courses)
    }

    /// Courses the signed-in user is enrolled on.
    pub async fn get_my_courses(&self) -> Result<Vec<MyCourse>, AppError> {
        let courses = self
            .api
            .get(&endpoints::my_courses())
            .await
            .map_err(|e| self.errors.report(e))?;
        self.store.set_logged_in();
        Ok(courses)
    }

    pub async fn get_course_name(&self, course_id: i64) -> Result<String, AppError> {
        let info: CourseInfo = self
            .api
            .get(&endpoints::course(course_id))
            .await
            .map_err(|e| self.errors.report(e))?;
        Ok(info.name)
    }

    /// Additional fields a new ticket on this course asks for.
    pub async fn get_ticket_field_info(&self, course_id: i64) -> Result<Vec<TicketField>, AppError> {
        let fields: Option<Vec<TicketField>> = self
            .api
            .get(&endpoints::field_template(course_id))
            .await
            .map_err(|e| self.errors.report(e))?;
        Ok(fields.unwrap_or_default())
    }

    /// Replace the course's field template. Ids are stripped so the backend
    /// creates fresh fields. Returns whether the backend accepted it.
    pub async fn set_ticket_field_info(&self, course_id: i64, mut fields: Vec<TicketField>) -> bool {
        for field in &mut fields {
            field.id = None;
        }
        let body = FieldTemplateBody { fields: &fields };

        match self
            .api
            .put::<_, SuccessResponse>(&endpoints::field_template(course_id), &body)
            .await
        {
            Ok(response) => response.success,
            Err(e) => {
                self.errors.report(e);
                false
            }
        }
    }

    pub async fn get_invited_info(&self, course_id: i64, token: Uuid) -> Result<InvitedInfo, AppError> {
        self.api
            .get(&endpoints::invitation(course_id, token))
            .await
            .map_err(|e| self.errors.report(e))
    }

    /// Consume an invitation and enrol the signed-in user.
    pub async fn join_course(&self, course_id: i64, token: Uuid) -> Result<SuccessResponse, AppError> {
        self.api
            .post(&endpoints::participants(course_id), &JoinRequest { token })
            .await
            .map_err(|e| self.errors.report(e))
    }

    pub async fn send_invitation(
        &self,
        course_id: i64,
        email: &str,
        role: Role,
    ) -> Result<InvitationResponse, AppError> {
        let body = NewInvitation {
            email: email.to_string(),
            role,
        };
        self.api
            .post(&endpoints::invitations(course_id), &body)
            .await
            .map_err(|e| self.errors.report(e))
    }

    /// The course's FAQs as pretty-printed JSON, ready to be saved to a file.
    pub async fn export_faqs(&self, course_id: i64) -> Result<String, AppError> {
        let faqs: serde_json::Value = self
            .api
            .get(&endpoints::faq_export(course_id))
            .await
            .map_err(|e| self.errors.report(e))?;
        Ok(serde_json::to_string_pretty(&faqs)?)
    }

    /// Post FAQs previously produced by [`export_faqs`](Self::export_faqs).
    pub async fn import_faqs(&self, course_id: i64, content: &str) -> Result<SuccessResponse, AppError> {
        let faqs: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| AppError::invalid_input_field(e.to_string(), "file"))?;
        self.api
            .post(&endpoints::faq_export(course_id), &faqs)
            .await
            .map_err(|e| self.errors.report(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api_client::ApiClientConfig;
    use crate::services::localization::Localizer;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> (Arc<Store>, CourseService) {
        let api = ApiClient::new(ApiClientConfig {
            base_url: server.uri(),
            timeout_secs: 5,
        })
        .unwrap();
        let store = Arc::new(Store::new());
        let errors = Arc::new(ErrorHandler::new(store.clone(), Arc::new(Localizer::default())));
        (store.clone(), CourseService::new(Arc::new(api), store, errors))
    }

    #[tokio::test]
    async fn test_my_courses_sets_logged_in() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/minun/kurssit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"kurssi": 1, "asema": "opiskelija"}
            ])))
            .mount(&server)
            .await;

        let (store, courses) = service(&server);
        let mine = courses.get_my_courses().await.unwrap();
        assert_eq!(mine[0].course_id, 1);
        assert_eq!(store.is_logged_in(), Some(true));
    }

    #[tokio::test]
    async fn test_null_field_template_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/kurssi/2/tikettipohja/kentat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let (_, courses) = service(&server);
        assert!(courses.get_ticket_field_info(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_field_template_strips_ids() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/kurssi/2/tikettipohja/kentat"))
            .and(body_json(serde_json::json!({
                "kentat": [{"otsikko": "Tehtava", "arvo": "", "ohje": "", "pakollinen": true,
                            "esitaytettava": false, "valinnat": []}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .mount(&server)
            .await;

        let (_, courses) = service(&server);
        let field = TicketField {
            id: Some(41),
            title: "Tehtava".to_string(),
            required: true,
            ..Default::default()
        };
        assert!(courses.set_ticket_field_info(2, vec![field]).await);
    }

    #[tokio::test]
    async fn test_failure_is_reported_and_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/kurssi/9"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let (store, courses) = service(&server);
        let err = courses.get_course_name(9).await.unwrap_err();
        assert!(err.is_not_logged_in());
        assert_eq!(store.is_logged_in(), Some(false));
    }

    #[tokio::test]
    async fn test_export_is_pretty_printed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/kurssi/1/ukk/vienti"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{"otsikko": "Q"}])))
            .mount(&server)
            .await;

        let (_, courses) = service(&server);
        let exported = courses.export_faqs(1).await.unwrap();
        assert!(exported.contains("\n  {"));
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_json_without_request() {
        let server = MockServer::start().await;
        let (_, courses) = service(&server);
        let err = courses.import_faqs(1, "{not json").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_courses_sets_logged_in() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/kurssit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "nimi": "Ohjelmointi 1"},
                {"id": 2, "nimi": "Tietorakenteet"}
            ])))
            .mount(&server)
            .await;

        let (store, courses) = service(&server);
        let all = courses.get_courses().await.unwrap();
        assert_eq!(all[1].name, "Tietorakenteet");
        assert_eq!(store.is_logged_in(), Some(true));
    }

    #[tokio::test]
    async fn test_send_invitation_wire_shape() {
        let server = MockServer::start().await;
        let token = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/kurssi/1/osallistujat/kutsu"))
            .and(body_json(serde_json::json!({
                "sposti": "new.student@example.com", "rooli": "opiskelija"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true, "kutsu": token
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (_, courses) = service(&server);
        let response = courses
            .send_invitation(1, "new.student@example.com", Role::Student)
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.token, Some(token));
    }
}
