use std::collections::BTreeMap;

use anyhow::Error;
use clap::Parser;
use olympus_http::{ContentType, Handler, Method, Request, Response, Server, ServerOptions, Status};
use serde::Serialize;
use tracing::{event, Level};

/// Keeps plain text notes in memory, served as JSON.
///
/// ```text
/// GET    /notes        list all notes
/// POST   /notes        add a note, the body is its text
/// GET    /notes/{id}   read a note
/// PUT    /notes/{id}   create or replace a note
/// DELETE /notes/{id}   remove a note
/// ```
#[derive(Debug, Parser)]
#[command(name = "notes")]
struct Args {
    /// Preferred port, the next free one is used if it's taken
    #[arg(short, long, default_value = "8000", env = "OLYMPUS_PORT")]
    port: u16,

    /// Largest accepted note, in bytes
    #[arg(long, default_value = "65536", env = "OLYMPUS_MAX_BODY")]
    max_body: usize,
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    devutils::init_logging("info");

    let options = ServerOptions {
        port: args.port,
        max_body_size: args.max_body,
        ..ServerOptions::default()
    };
    let mut server = Server::bind(options, Notes::default())?;
    event!(Level::INFO, port = server.port()?, "serving notes");

    server.run()?;

    Ok(())
}

#[derive(Default)]
struct Notes {
    notes: BTreeMap<u64, String>,
    next_id: u64,
}

#[derive(Serialize)]
struct Note<'a> {
    id: u64,
    text: &'a str,
}

impl Handler for Notes {
    fn handle(&mut self, request: Request) -> Response {
        if !request.is_valid() {
            return Response::from_status(Status::BadRequest);
        }

        let (status, body) = match (request.collections(), request.resource()) {
            ([], "notes") => self.handle_collection(&request),
            ([notes], id) if notes == "notes" => match id.parse() {
                Ok(id) => self.handle_note(&request, id),
                Err(_) => (Status::BadRequest, None),
            },
            _ => (Status::NotFound, None),
        };

        let mut builder = Response::builder()
            .version(request.http_version())
            .status(status);
        if let Some(body) = body {
            builder = builder.content_type(ContentType::Json).body(body);
        }
        builder.build()
    }
}

impl Notes {
    fn handle_collection(&mut self, request: &Request) -> (Status, Option<String>) {
        match request.method() {
            Method::Get => {
                let notes: Vec<_> = self
                    .notes
                    .iter()
                    .map(|(id, text)| Note { id: *id, text })
                    .collect();
                (Status::Ok, to_json(&notes))
            }
            Method::Post => {
                let id = self.next_id;
                self.insert(id, request);
                (Status::Created, self.render(id))
            }
            _ => (Status::NotFound, None),
        }
    }

    fn handle_note(&mut self, request: &Request, id: u64) -> (Status, Option<String>) {
        match request.method() {
            Method::Get => match self.render(id) {
                Some(body) => (Status::Ok, Some(body)),
                None => (Status::NotFound, None),
            },
            Method::Put => {
                let created = !self.notes.contains_key(&id);
                self.insert(id, request);

                let status = if created { Status::Created } else { Status::Ok };
                (status, self.render(id))
            }
            Method::Delete => match self.notes.remove(&id) {
                Some(_) => (Status::Ok, None),
                None => (Status::NotFound, None),
            },
            _ => (Status::NotFound, None),
        }
    }

    fn insert(&mut self, id: u64, request: &Request) {
        let text = String::from_utf8_lossy(request.body()).into_owned();
        event!(Level::INFO, id, "storing note");

        self.notes.insert(id, text);
        self.next_id = self.next_id.max(id.saturating_add(1));
    }

    fn render(&self, id: u64) -> Option<String> {
        let text = self.notes.get(&id)?;
        to_json(&Note { id, text })
    }
}

fn to_json(value: &impl Serialize) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(json) => Some(json),
        Err(error) => {
            event!(Level::ERROR, %error, "failed to serialize");
            None
        }
    }
}
