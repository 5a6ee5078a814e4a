//! Wire types for the records backend. Field names follow the backend's
//! camel/snake mix verbatim via serde renames.

use serde::{Deserialize, Serialize};

use crate::session::Identity;

/// `POST /auth/refresh` reply: a fresh access token and a possibly rotated
/// refresh token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// `POST /auth/login` reply.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginReply {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    pub user: Identity,
}

/// Flat intake form submitted to `POST /std/submit` and `PUT /std/edit/:id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentForm {
    pub std_id: String,
    pub prefix: String,
    #[serde(rename = "std_Fname")]
    pub std_fname: String,
    #[serde(rename = "std_Lname")]
    pub std_lname: String,
    pub std_nickname: String,
    pub std_religion: String,
    pub major: String,
    pub std_tel: String,
    pub std_father_name: String,
    pub std_father_tel: String,
    pub std_mother_name: String,
    pub std_mother_tel: String,
    pub std_parent_name: String,
    pub std_parent_tel: String,
    pub std_parent_rela: String,
    pub allergic_things: String,
    pub allergic_drugs: String,
    pub allergic_condition: String,
    pub sch_name: String,
    pub sch_province: String,
}

/// Identity block of a stored student record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentCore {
    pub std_id: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(rename = "std_Fname")]
    pub std_fname: String,
    #[serde(rename = "std_Lname")]
    pub std_lname: String,
    #[serde(default)]
    pub std_nickname: String,
    #[serde(default)]
    pub std_religion: String,
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub std_tel: String,
}

/// Guardian and medical block (the backend's `studentDetails`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentDetails {
    #[serde(default)]
    pub std_father_name: String,
    #[serde(default)]
    pub std_father_tel: String,
    #[serde(default)]
    pub std_mother_name: String,
    #[serde(default)]
    pub std_mother_tel: String,
    #[serde(default)]
    pub std_parent_name: String,
    #[serde(default)]
    pub std_parent_tel: String,
    #[serde(default)]
    pub std_parent_rela: String,
    #[serde(default)]
    pub allergic_things: String,
    #[serde(default)]
    pub allergic_drugs: String,
    #[serde(default)]
    pub allergic_condition: String,
}

/// School block (the backend's `studentSchool`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentSchool {
    #[serde(default)]
    pub sch_name: String,
    #[serde(default)]
    pub sch_province: String,
}

/// Three-part bundle returned by `GET /std/reads` and `GET /std/read/:id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentBundle {
    pub student: StudentCore,
    #[serde(rename = "studentDetails", default)]
    pub details: StudentDetails,
    #[serde(rename = "studentSchool", default)]
    pub school: StudentSchool,
}

/// Row of `GET /user/users`; also the `PUT /user/users/:id` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserAccount {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: crate::session::Role,
}

/// Plain `{message}` acknowledgement body used by several endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
}
