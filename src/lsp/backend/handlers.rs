//! LSP protocol handler implementations
//!
//! This module contains the `tower_lsp::LanguageServer` implementation for
//! the Emmet backend:
//! - Lifecycle handlers (initialize, initialized, shutdown)
//! - Document lifecycle (did_open, did_change, did_close)
//! - Configuration refresh (did_change_configuration)
//! - The completion provider and the `emmet.expand` command

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tower_lsp::jsonrpc;
use tower_lsp::lsp_types::{
    CompletionOptions, CompletionParams, CompletionResponse, DidChangeConfigurationParams,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    ExecuteCommandOptions, ExecuteCommandParams, InitializeParams, InitializeResult,
    InitializedParams, Range, ServerCapabilities, ServerInfo, TextDocumentSyncCapability,
    TextDocumentSyncKind, TextEdit, Url, WorkspaceEdit,
};
use tower_lsp::LanguageServer;
use tracing::{debug, info, warn};

use super::EXPAND_COMMAND;
use super::state::EmmetBackend;
use crate::config::EmmetSettings;
use crate::lsp::document::Document;

/// Argument carried by the expand command. LSP has no ambient "active
/// editor", so the client supplies the document and selection explicitly.
#[derive(Debug, Deserialize)]
struct ExpandCommandArgs {
    uri: Url,
    selection: Range,
}

#[tower_lsp::async_trait]
impl LanguageServer for EmmetBackend {
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        info!("Received initialize request");

        if let Some(options) = params.initialization_options {
            *self.settings.write() = EmmetSettings::from_value(&options);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![EXPAND_COMMAND.to_string()],
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("Server initialized");
    }

    async fn shutdown(&self) -> jsonrpc::Result<()> {
        info!("Received shutdown request");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        debug!("Opened {} ({}, version {})", doc.uri, doc.language_id, doc.version);
        self.documents
            .insert(doc.uri, Document::new(doc.language_id, &doc.text, doc.version));
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        match self.documents.get_mut(&uri) {
            Some(mut document) => {
                document.apply(params.content_changes, params.text_document.version);
            }
            None => warn!("Change for unopened document: {}", uri),
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!("Closed {}", params.text_document.uri);
        self.documents.remove(&params.text_document.uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let settings = EmmetSettings::from_value(&params.settings);
        debug!("Configuration changed: {:?}", settings);
        *self.settings.write() = settings;
    }

    async fn completion(
        &self,
        params: CompletionParams,
    ) -> jsonrpc::Result<Option<CompletionResponse>> {
        if !self.settings.read().autocomplete {
            return Ok(Some(CompletionResponse::Array(Vec::new())));
        }

        let position = params.text_document_position.position;
        let uri = params.text_document_position.text_document.uri;
        debug!(
            "Completion request at {}:{}:{}",
            uri, position.line, position.character
        );

        Ok(self
            .completions_at(&uri, position)
            .map(CompletionResponse::Array))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> jsonrpc::Result<Option<Value>> {
        if params.command != EXPAND_COMMAND {
            warn!("Ignoring unknown command: {}", params.command);
            return Ok(None);
        }
        let Some(argument) = params.arguments.into_iter().next() else {
            warn!("{} invoked without arguments", EXPAND_COMMAND);
            return Ok(None);
        };
        let args: ExpandCommandArgs = match serde_json::from_value(argument) {
            Ok(args) => args,
            Err(err) => {
                warn!("Malformed {} arguments: {}", EXPAND_COMMAND, err);
                return Ok(None);
            }
        };

        let Some((range, template)) = self.expand_edit(&args.uri, args.selection) else {
            return Ok(None);
        };

        let edit = WorkspaceEdit {
            changes: Some(HashMap::from([(
                args.uri,
                vec![TextEdit {
                    range,
                    new_text: template,
                }],
            )])),
            ..Default::default()
        };
        match self.client.apply_edit(edit).await {
            Ok(response) if !response.applied => {
                warn!(
                    "Client declined the expansion edit: {:?}",
                    response.failure_reason
                );
            }
            Ok(_) => {}
            Err(err) => warn!("workspace/applyEdit failed: {}", err),
        }
        Ok(None)
    }
}
