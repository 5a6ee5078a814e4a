//!
//! registra admin console
//! ----------------------
//! Interactive interpreter over the records backend: authentication,
//! student-record CRUD with client-side search, user administration and
//! dashboard aggregations. Every protected call goes through the session
//! manager's with_auth wrapper so an expired token is refreshed and the
//! request retried once.

pub mod table;

use std::time::Duration;

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::api::{ApiClient, StudentBundle, StudentForm, UserAccount};
use crate::dashboard;
use crate::error::AppError;
use crate::records::{self, SearchField};
use crate::session::{Credential, RefreshTask, Role, SessionManager};

fn print_usage() {
    eprintln!(
        "Commands:\n  login <user> <password>            authenticate against the backend\n  register <user> <email> <password> create an account (starts in the Wait role)\n  logout                             end the session and clear the stored record\n  refresh                            exchange the refresh token now\n  status                             show connection and session info\n  profile                            show the signed-in user\n  students [search <field> <term>]   list records; fields: all, std_id, fname,\n                                     lname, nickname, tel, province, major\n  student <id>                       show one record in full\n  student-add <file.json>            validate and submit an intake form\n  student-edit <id> <file.json>      validate and replace a record\n  student-del <id>                   delete a record (asks for confirmation)\n  users                              list accounts (admin)\n  user-role <id> <role>              change an account role (admin); role: 0|1|2\n  user-del <id>                      delete an account (admin)\n  dashboard [prefix]                 cohort/major/province counts (default prefix 25)\n  help                               show this help\n  quit | exit                        leave the console"
    );
}

pub struct Console {
    api: ApiClient,
    manager: SessionManager,
    refresh_every: Duration,
    refresh_task: Option<RefreshTask>,
}

impl Console {
    pub fn new(api: ApiClient, manager: SessionManager, refresh_every: Duration) -> Self {
        Console { api, manager, refresh_every, refresh_task: None }
    }

    pub async fn run(mut self) -> Result<()> {
        println!("registra console. Type 'help' for commands.");
        if let Some(identity) = self.manager.identity() {
            println!("session restored for {} ({})", identity.username, identity.role);
            self.refresh_task = Some(self.manager.spawn_periodic_refresh(self.refresh_every));
        }

        let mut rl = DefaultEditor::new()?;
        loop {
            let line = match rl.readline("registra> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    eprintln!("input error: {}", e);
                    break;
                }
            };
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            rl.add_history_entry(line.as_str()).ok();

            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts[0].to_ascii_lowercase().as_str() {
                "quit" | "exit" => break,
                "help" => print_usage(),
                "login" => {
                    if parts.len() != 3 {
                        eprintln!("usage: login <user> <password>");
                        continue;
                    }
                    self.login(parts[1], parts[2]).await;
                }
                "register" => {
                    if parts.len() != 4 {
                        eprintln!("usage: register <user> <email> <password>");
                        continue;
                    }
                    self.register(parts[1], parts[2], parts[3]).await;
                }
                "logout" => self.logout(),
                "refresh" => self.refresh().await,
                "status" => self.status(),
                "profile" => self.profile(),
                "students" => {
                    let (field, term) = match parts.as_slice() {
                        [_] => (SearchField::All, String::new()),
                        [_, "search", f, t @ ..] if !t.is_empty() => match SearchField::parse(f) {
                            Some(field) => (field, t.join(" ")),
                            None => {
                                eprintln!("unknown search field: {}", f);
                                continue;
                            }
                        },
                        _ => {
                            eprintln!("usage: students [search <field> <term>]");
                            continue;
                        }
                    };
                    self.students(field, &term).await;
                }
                "student" => {
                    if parts.len() != 2 {
                        eprintln!("usage: student <id>");
                        continue;
                    }
                    self.student(parts[1]).await;
                }
                "student-add" => {
                    if parts.len() != 2 {
                        eprintln!("usage: student-add <file.json>");
                        continue;
                    }
                    self.student_add(parts[1]).await;
                }
                "student-edit" => {
                    if parts.len() != 3 {
                        eprintln!("usage: student-edit <id> <file.json>");
                        continue;
                    }
                    self.student_edit(parts[1], parts[2]).await;
                }
                "student-del" => {
                    if parts.len() != 2 {
                        eprintln!("usage: student-del <id>");
                        continue;
                    }
                    self.student_del(&mut rl, parts[1]).await;
                }
                "users" => self.users().await,
                "user-role" => {
                    if parts.len() != 3 {
                        eprintln!("usage: user-role <id> <role>");
                        continue;
                    }
                    self.user_role(parts[1], parts[2]).await;
                }
                "user-del" => {
                    if parts.len() != 2 {
                        eprintln!("usage: user-del <id>");
                        continue;
                    }
                    self.user_del(&mut rl, parts[1]).await;
                }
                "dashboard" => {
                    let prefix = parts.get(1).copied().unwrap_or("25");
                    self.dashboard(prefix).await;
                }
                other => eprintln!("unknown command: {} (try 'help')", other),
            }
        }
        Ok(())
    }

    async fn login(&mut self, username: &str, password: &str) {
        match self.api.login(username, password).await {
            Ok(reply) => {
                let credential = Credential {
                    access_token: reply.access_token,
                    refresh_token: reply.refresh_token,
                };
                self.manager.update_session(credential, reply.user);
                self.refresh_task = Some(self.manager.spawn_periodic_refresh(self.refresh_every));
                println!("Login successful!");
            }
            Err(e) => eprintln!("{}", e.user_message("Login failed")),
        }
    }

    async fn register(&self, username: &str, email: &str, password: &str) {
        match self.api.register(username, email, password).await {
            Ok(_) => println!("Registration successful!"),
            Err(e) => eprintln!("{}", e.user_message("Registration failed")),
        }
    }

    fn logout(&mut self) {
        self.refresh_task = None;
        self.manager.logout();
        if let Some(msg) = self.manager.logout_message() {
            println!("{}", msg);
        }
    }

    async fn refresh(&mut self) {
        if !self.manager.is_authenticated() {
            println!("not logged in");
            return;
        }
        if self.manager.refresh_access_token().await {
            println!("Token refreshed.");
        } else {
            self.refresh_task = None;
            println!("Refresh failed; you have been signed out.");
            if let Some(msg) = self.manager.logout_message() {
                println!("{}", msg);
            }
        }
    }

    fn status(&self) {
        println!("backend: {}", self.api.base());
        match self.manager.identity() {
            Some(identity) => {
                println!("session: authenticated as {} ({})", identity.username, identity.role);
                if let Some(at) = self.manager.signed_in_at() {
                    println!("since:   {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
                }
                println!(
                    "refresh: every {}s{}",
                    self.refresh_every.as_secs(),
                    if self.refresh_task.is_some() { " (running)" } else { " (stopped)" }
                );
            }
            None => println!("session: not authenticated"),
        }
    }

    fn profile(&self) {
        match self.manager.identity() {
            Some(identity) => {
                println!("username: {}", identity.username);
                println!("email:    {}", identity.email);
                println!("role:     {}", identity.role);
            }
            None => println!("not logged in"),
        }
    }

    fn require_admin(&self) -> bool {
        match self.manager.identity() {
            Some(identity) if identity.role == Role::Admin => true,
            Some(_) => {
                eprintln!("admin role required");
                false
            }
            None => {
                eprintln!("not logged in");
                false
            }
        }
    }

    async fn fetch_students(&self) -> Result<Vec<StudentBundle>, AppError> {
        let api = self.api.clone();
        self.manager
            .with_auth(move |token| {
                let api = api.clone();
                async move { api.list_students(&token).await }
            })
            .await
    }

    async fn students(&self, field: SearchField, term: &str) {
        let rows = match self.fetch_students().await {
            Ok(rows) => rows,
            Err(e) => {
                eprintln!("{}", e.user_message("Failed to fetch students"));
                return;
            }
        };
        let hits = records::search(&rows, field, term);
        println!("{} result{} found.", hits.len(), if hits.len() == 1 { "" } else { "s" });
        let table_rows: Vec<Vec<String>> = hits
            .iter()
            .map(|b| {
                vec![
                    b.student.std_id.clone(),
                    format!("{} {} {}", b.student.prefix, b.student.std_fname, b.student.std_lname)
                        .trim()
                        .to_string(),
                    b.student.std_nickname.clone(),
                    b.student.std_tel.clone(),
                    b.school.sch_province.clone(),
                    b.student.major.clone(),
                ]
            })
            .collect();
        table::print_table(&["std_id", "name", "nickname", "tel", "province", "major"], &table_rows);
    }

    async fn student(&self, std_id: &str) {
        let api = self.api.clone();
        let id = std_id.to_string();
        let res = self
            .manager
            .with_auth(move |token| {
                let api = api.clone();
                let id = id.clone();
                async move { api.get_student(&token, &id).await }
            })
            .await;
        match res {
            Ok(b) => print_student_details(&b),
            Err(e) => eprintln!("{}", e.user_message("Failed to fetch student details")),
        }
    }

    async fn student_add(&self, path: &str) {
        let form = match load_form(path) {
            Ok(form) => form,
            Err(e) => {
                eprintln!("{}", e);
                return;
            }
        };
        if let Err(e) = records::validate_form(&form) {
            eprintln!("{}", e.user_message("Submit"));
            return;
        }
        let api = self.api.clone();
        let res = self
            .manager
            .with_auth(move |token| {
                let api = api.clone();
                let form = form.clone();
                async move { api.submit_student(&token, &form).await }
            })
            .await;
        match res {
            Ok(ack) if !ack.message.is_empty() => println!("{}", ack.message),
            Ok(_) => println!("Student submitted successfully."),
            Err(e) => eprintln!("{}", e.user_message("Error submitting form")),
        }
    }

    async fn student_edit(&self, std_id: &str, path: &str) {
        let form = match load_form(path) {
            Ok(form) => form,
            Err(e) => {
                eprintln!("{}", e);
                return;
            }
        };
        if let Err(e) = records::validate_form(&form) {
            eprintln!("{}", e.user_message("Submit"));
            return;
        }
        let api = self.api.clone();
        let id = std_id.to_string();
        let res = self
            .manager
            .with_auth(move |token| {
                let api = api.clone();
                let id = id.clone();
                let form = form.clone();
                async move { api.edit_student(&token, &id, &form).await }
            })
            .await;
        match res {
            Ok(ack) if !ack.message.is_empty() => println!("{}", ack.message),
            Ok(_) => println!("Student updated successfully."),
            Err(e) => eprintln!("{}", e.user_message("Failed to update student")),
        }
    }

    async fn student_del(&self, rl: &mut DefaultEditor, std_id: &str) {
        if !confirm(rl, &format!("Are you sure you want to delete student with ID: {}?", std_id)) {
            return;
        }
        let api = self.api.clone();
        let id = std_id.to_string();
        let res = self
            .manager
            .with_auth(move |token| {
                let api = api.clone();
                let id = id.clone();
                async move { api.delete_student(&token, &id).await }
            })
            .await;
        match res {
            Ok(_) => println!("Student deleted successfully."),
            Err(e) => eprintln!("{}", e.user_message("Failed to delete student")),
        }
    }

    async fn users(&self) {
        if !self.require_admin() {
            return;
        }
        let api = self.api.clone();
        let res = self
            .manager
            .with_auth(move |token| {
                let api = api.clone();
                async move { api.list_users(&token).await }
            })
            .await;
        match res {
            Ok(users) => {
                let rows: Vec<Vec<String>> = users
                    .iter()
                    .map(|u| {
                        vec![u.id.clone(), u.username.clone(), u.email.clone(), u.role.to_string()]
                    })
                    .collect();
                table::print_table(&["id", "username", "email", "role"], &rows);
            }
            Err(e) => eprintln!("{}", e.user_message("Failed to fetch users")),
        }
    }

    async fn user_role(&self, user_id: &str, role: &str) {
        if !self.require_admin() {
            return;
        }
        let Some(role) = Role::parse(role) else {
            eprintln!("unknown role: {} (use 0, 1 or 2)", role);
            return;
        };
        // The backend replaces the whole row, so fetch it first.
        let api = self.api.clone();
        let listed = self
            .manager
            .with_auth(move |token| {
                let api = api.clone();
                async move { api.list_users(&token).await }
            })
            .await;
        let account = match listed {
            Ok(users) => match users.into_iter().find(|u| u.id == user_id) {
                Some(u) => UserAccount { role, ..u },
                None => {
                    eprintln!("no user with id {}", user_id);
                    return;
                }
            },
            Err(e) => {
                eprintln!("{}", e.user_message("Failed to fetch users"));
                return;
            }
        };
        let api = self.api.clone();
        let res = self
            .manager
            .with_auth(move |token| {
                let api = api.clone();
                let account = account.clone();
                async move { api.update_user(&token, &account).await }
            })
            .await;
        match res {
            Ok(updated) => println!("User updated successfully. {} is now {}.", updated.username, updated.role),
            Err(e) => eprintln!("{}", e.user_message("Failed to update user")),
        }
    }

    async fn user_del(&self, rl: &mut DefaultEditor, user_id: &str) {
        if !self.require_admin() {
            return;
        }
        if !confirm(rl, "Are you sure you want to delete this user?") {
            return;
        }
        let api = self.api.clone();
        let id = user_id.to_string();
        let res = self
            .manager
            .with_auth(move |token| {
                let api = api.clone();
                let id = id.clone();
                async move { api.delete_user(&token, &id).await }
            })
            .await;
        match res {
            Ok(_) => println!("User deleted successfully."),
            Err(e) => eprintln!("{}", e.user_message("Failed to delete user")),
        }
    }

    async fn dashboard(&self, prefix: &str) {
        let rows = match self.fetch_students().await {
            Ok(rows) => rows,
            Err(e) => {
                eprintln!("{}", e.user_message("Failed to fetch students"));
                return;
            }
        };
        let cohorts = dashboard::cohort_prefixes(&rows);
        println!("cohorts: {}", cohorts.join(", "));
        let filtered = dashboard::filter_by_cohort(&rows, prefix);
        println!("filter: '{}' ({} students)", prefix, filtered.len());

        println!("students per cohort:");
        print_counts(dashboard::cohort_counts(filtered.iter().copied()), "cohort");
        println!("students per major:");
        print_counts(dashboard::major_counts(filtered.iter().copied()), "major");
        println!("students per home province:");
        print_counts(dashboard::province_counts(filtered.iter().copied()), "province");
    }
}

fn print_counts(counts: std::collections::BTreeMap<String, usize>, label: &str) {
    let rows: Vec<Vec<String>> = counts.into_iter().map(|(k, v)| vec![k, v.to_string()]).collect();
    table::print_table(&[label, "count"], &rows);
}

fn print_student_details(b: &StudentBundle) {
    println!("-- student --");
    println!("id:        {}", b.student.std_id);
    println!("name:      {} {} {}", b.student.prefix, b.student.std_fname, b.student.std_lname);
    println!("nickname:  {}", b.student.std_nickname);
    println!("religion:  {}", b.student.std_religion);
    println!("major:     {}", b.student.major);
    println!("tel:       {}", b.student.std_tel);
    println!("-- guardians --");
    println!("father:    {} ({})", b.details.std_father_name, b.details.std_father_tel);
    println!("mother:    {} ({})", b.details.std_mother_name, b.details.std_mother_tel);
    println!("guardian:  {} ({}) relation: {}", b.details.std_parent_name, b.details.std_parent_tel, b.details.std_parent_rela);
    println!("-- medical --");
    println!("allergies: {}", b.details.allergic_things);
    println!("drugs:     {}", b.details.allergic_drugs);
    println!("condition: {}", b.details.allergic_condition);
    println!("-- school --");
    println!("school:    {}", b.school.sch_name);
    println!("province:  {}", b.school.sch_province);
}

fn load_form(path: &str) -> Result<StudentForm, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path, e))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid form in {}: {}", path, e))
}

fn confirm(rl: &mut DefaultEditor, prompt: &str) -> bool {
    match rl.readline(&format!("{} (y/N) ", prompt)) {
        Ok(answer) => answer.trim().eq_ignore_ascii_case("y"),
        Err(_) => false,
    }
}
