//! Authentication-related models

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::role::UserRole;
use crate::client::MultipartForm;
use crate::error::ClientError;

/// 证明文件大小上限：5 MiB
pub const MAX_PROOF_SIZE_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_PROOF_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];
const ALLOWED_PROOF_EXTENSIONS: [&str; 4] = [".pdf", ".jpg", ".jpeg", ".png"];

/// Login request
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub access: SecretString,
    pub refresh: SecretString,
    pub role: UserRole,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub id: i64,
    pub email: String,
}

/// Token refresh request
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Token refresh response
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: Option<SecretString>,
}

/// 上传的权限证明文件
#[derive(Debug, Clone)]
pub struct ProofFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ProofFile {
    /// 扩展名或 MIME 其一合法即可，MIME 缺失视为合法
    pub fn check(&self) -> Result<(), ClientError> {
        let lower_name = self.file_name.to_lowercase();
        let has_valid_ext = ALLOWED_PROOF_EXTENSIONS
            .iter()
            .any(|ext| lower_name.ends_with(ext));
        let has_valid_type = match self.content_type.as_deref() {
            None | Some("") => true,
            Some(ct) => ALLOWED_PROOF_TYPES.contains(&ct.to_lowercase().as_str()),
        };

        if (!has_valid_ext && !has_valid_type) || !self.content_type_well_formed() {
            return Err(ClientError::Validation(
                "Invalid file type. Use PDF or JPG/PNG images only.".to_string(),
            ));
        }

        if self.bytes.len() > MAX_PROOF_SIZE_BYTES {
            return Err(ClientError::Validation(
                "File too large. Maximum size is 5MB.".to_string(),
            ));
        }

        Ok(())
    }

    /// 非空 MIME 必须是 `type/subtype`
    fn content_type_well_formed(&self) -> bool {
        match self.content_type.as_deref() {
            None | Some("") => true,
            Some(ct) => match ct.split_once('/') {
                Some((kind, sub)) => {
                    !kind.is_empty()
                        && !sub.is_empty()
                        && !sub.contains('/')
                        && !ct.chars().any(char::is_whitespace)
                }
                None => false,
            },
        }
    }

    /// 发送用的 MIME，空串视为未提供
    fn mime(&self) -> Option<&str> {
        self.content_type.as_deref().filter(|ct| !ct.is_empty())
    }
}

/// 注册表单
#[derive(Debug, Clone, Default, Validate)]
pub struct SignupForm {
    pub role: Option<UserRole>,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub confirm_password: String,

    // 居民字段
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub contact_no: String,
    pub age: String,
    pub gender: String,
    pub location: String,

    // 服务机构 / 村官字段
    pub name: String,
    pub barangay_name: String,
    pub contact: String,
    pub service_type: String,

    pub proof_of_authority: Option<ProofFile>,
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl SignupForm {
    /// 注册角色，未指定时按居民处理
    pub fn role(&self) -> UserRole {
        self.role.unwrap_or(UserRole::Resident)
    }

    /// 按角色校验必填字段、密码确认和证明文件
    pub fn check(&self) -> Result<(), ClientError> {
        let role = self.role();

        if !role.can_self_register() {
            return Err(ClientError::Validation(format!(
                "{} accounts cannot be registered",
                role
            )));
        }

        match role {
            UserRole::Resident => {
                if blank(&self.first_name) || blank(&self.last_name) || blank(&self.email) {
                    return Err(ClientError::Validation(
                        "Please fill all resident fields".to_string(),
                    ));
                }
                if blank(&self.location) {
                    return Err(ClientError::Validation(
                        "Please select your barangay".to_string(),
                    ));
                }
            }
            UserRole::Services => {
                if blank(&self.name)
                    || blank(&self.location)
                    || blank(&self.email)
                    || blank(&self.service_type)
                {
                    return Err(ClientError::Validation(
                        "Please fill all services fields".to_string(),
                    ));
                }
            }
            UserRole::BrgyOfficials => {
                if blank(&self.barangay_name) || blank(&self.location) || blank(&self.email) {
                    return Err(ClientError::Validation(
                        "Please fill all official fields".to_string(),
                    ));
                }
            }
            UserRole::Admin => {}
        }

        if self.password != self.confirm_password {
            return Err(ClientError::Validation("Passwords do not match".to_string()));
        }

        match &self.proof_of_authority {
            Some(file) => file.check()?,
            None => {
                return Err(ClientError::Validation(
                    "Proof of authority is required".to_string(),
                ))
            }
        }

        self.validate()?;

        Ok(())
    }

    /// 构造 multipart 表单，字段名与后端一致
    pub fn to_multipart(&self) -> MultipartForm {
        let mut form = MultipartForm::new()
            .text("role", self.role().as_str())
            .text("email", &self.email)
            .text("password", &self.password)
            .text("firstName", &self.first_name)
            .text("middleName", &self.middle_name)
            .text("lastName", &self.last_name)
            .text("contactNo", &self.contact_no)
            .text("age", &self.age)
            .text("gender", &self.gender)
            .text("location", &self.location)
            .text("name", &self.name)
            .text("barangayName", &self.barangay_name)
            .text("contact", &self.contact)
            .text("serviceType", &self.service_type);

        if let Some(file) = &self.proof_of_authority {
            form = form.file(
                "proofofAuthority",
                &file.file_name,
                file.mime(),
                file.bytes.clone(),
            );
        }

        form
    }
}

/// 注册响应
#[derive(Debug, Clone, Deserialize)]
pub struct SignupResponse {
    pub message: String,
    pub role: Option<UserRole>,
    pub created_id: Option<i64>,
}

impl SignupResponse {
    /// 注册后展示在登录页的提示
    pub fn approval_notice(role: UserRole) -> &'static str {
        match role {
            UserRole::Resident => "Registration submitted. Please wait for officials approval.",
            _ => "Registration submitted. Please wait for admin approval.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proof() -> ProofFile {
        ProofFile {
            file_name: "barangay-id.PNG".to_string(),
            content_type: Some("image/png".to_string()),
            bytes: vec![0u8; 128],
        }
    }

    fn resident_form() -> SignupForm {
        SignupForm {
            role: Some(UserRole::Resident),
            email: "juan@example.com".to_string(),
            password: "Secret123".to_string(),
            confirm_password: "Secret123".to_string(),
            first_name: "Juan".to_string(),
            last_name: "Dela Cruz".to_string(),
            location: "San Isidro".to_string(),
            proof_of_authority: Some(proof()),
            ..Default::default()
        }
    }

    #[test]
    fn test_resident_form_passes() {
        assert!(resident_form().check().is_ok());
    }

    #[test]
    fn test_resident_requires_barangay() {
        let mut form = resident_form();
        form.location = " ".to_string();
        let err = form.check().unwrap_err();
        assert_eq!(err.user_message(), "Please select your barangay");
    }

    #[test]
    fn test_services_required_fields() {
        let mut form = resident_form();
        form.role = Some(UserRole::Services);
        form.name = "Bureau of Fire Protection".to_string();
        let err = form.check().unwrap_err();
        assert_eq!(err.user_message(), "Please fill all services fields");

        form.service_type = "Fire".to_string();
        assert!(form.check().is_ok());
    }

    #[test]
    fn test_official_required_fields() {
        let mut form = resident_form();
        form.role = Some(UserRole::BrgyOfficials);
        let err = form.check().unwrap_err();
        assert_eq!(err.user_message(), "Please fill all official fields");

        form.barangay_name = "San Isidro".to_string();
        assert!(form.check().is_ok());
    }

    #[test]
    fn test_admin_cannot_register() {
        let mut form = resident_form();
        form.role = Some(UserRole::Admin);
        assert_eq!(
            form.check().unwrap_err().user_message(),
            "Admin accounts cannot be registered"
        );
    }

    #[test]
    fn test_password_mismatch() {
        let mut form = resident_form();
        form.confirm_password = "Other123".to_string();
        assert_eq!(form.check().unwrap_err().user_message(), "Passwords do not match");
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut form = resident_form();
        form.email = "not-an-email".to_string();
        assert_eq!(
            form.check().unwrap_err().user_message(),
            "Please enter a valid email address"
        );
    }

    #[test]
    fn test_proof_file_rules() {
        let mut form = resident_form();
        form.proof_of_authority = None;
        assert_eq!(
            form.check().unwrap_err().user_message(),
            "Proof of authority is required"
        );

        let file = ProofFile {
            file_name: "notes.txt".to_string(),
            content_type: Some("text/plain".to_string()),
            bytes: vec![1, 2, 3],
        };
        assert!(file.check().is_err());

        // 扩展名不符但 MIME 合法
        let file = ProofFile {
            file_name: "scan".to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: vec![1, 2, 3],
        };
        assert!(file.check().is_ok());

        let file = ProofFile {
            file_name: "scan.pdf".to_string(),
            content_type: None,
            bytes: vec![0u8; MAX_PROOF_SIZE_BYTES + 1],
        };
        assert_eq!(
            file.check().unwrap_err().user_message(),
            "File too large. Maximum size is 5MB."
        );
    }

    #[test]
    fn test_malformed_mime_rejected_with_valid_extension() {
        let file = ProofFile {
            file_name: "id.png".to_string(),
            content_type: Some("image png".to_string()),
            bytes: vec![1, 2, 3],
        };
        let err = file.check().unwrap_err();
        assert!(!err.is_network());
        assert_eq!(err.user_message(), "Invalid file type. Use PDF or JPG/PNG images only.");

        // 空 MIME 视为未提供，表单仍可构造
        let mut form = resident_form();
        form.proof_of_authority = Some(ProofFile {
            file_name: "id.png".to_string(),
            content_type: Some(String::new()),
            bytes: vec![1, 2, 3],
        });
        assert!(form.check().is_ok());
        assert!(form.to_multipart().to_reqwest().is_ok());
    }

    #[test]
    fn test_multipart_field_names() {
        let form = resident_form().to_multipart();
        let names: Vec<&str> = form.field_names().collect();
        assert_eq!(names.first(), Some(&"role"));
        assert!(names.contains(&"firstName"));
        assert!(names.contains(&"barangayName"));
        assert!(names.contains(&"serviceType"));
        assert_eq!(names.last(), Some(&"proofofAuthority"));
    }

    #[test]
    fn test_login_response_hides_tokens() {
        let json = r#"{
            "message": "Login successful",
            "access": "access-abc",
            "refresh": "refresh-xyz",
            "role": "BrgyOfficials",
            "user": {"id": 7, "email": "kap@example.com"}
        }"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.role, UserRole::BrgyOfficials);
        assert_eq!(resp.user.id, 7);

        let debug = format!("{:?}", resp);
        assert!(!debug.contains("access-abc"));
        assert!(!debug.contains("refresh-xyz"));
    }

    #[test]
    fn test_approval_notice() {
        assert!(SignupResponse::approval_notice(UserRole::Resident).contains("officials"));
        assert!(SignupResponse::approval_notice(UserRole::Services).contains("admin"));
    }
}
