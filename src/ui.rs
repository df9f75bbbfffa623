//! Single-page browser front end.
//!
//! Plain HTML with a small inline script that drives the JSON API:
//! upload → extract → ask → download. No build step, no assets.

use axum::response::Html;

/// GET / - The application page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Upload documents, ask questions, get AI-powered insights">
    <title>Document Insights Generator</title>
    <style>
        body { font-family: system-ui, sans-serif; max-width: 56rem; margin: 0 auto; padding: 1.5rem; color: #222; }
        h1 { color: #1F77B4; text-align: center; margin-bottom: .25rem; }
        .sub { text-align: center; color: #555; margin-bottom: 2rem; }
        section { border-top: 1px solid #ddd; padding: 1rem 0; }
        .hidden { display: none; }
        .insight { background: #f0f7ff; border-left: 5px solid #1F77B4; padding: 1rem; border-radius: 5px; white-space: pre-wrap; }
        .ok { color: #28a745; }
        .err { color: #b00020; }
        pre { background: #f6f6f6; padding: .75rem; white-space: pre-wrap; max-height: 20rem; overflow-y: auto; }
        textarea, input[type=password], select { width: 100%; box-sizing: border-box; margin: .25rem 0 .75rem; }
        fieldset { border: 1px solid #ddd; margin-bottom: 1rem; }
    </style>
</head>
<body>
    <h1>Document Insights Generator</h1>
    <p class="sub">Upload documents, ask questions, get AI-powered insights</p>

    <fieldset>
        <legend>Configuration</legend>
        <label>OpenAI API Key <input id="api-key" type="password" autocomplete="off" placeholder="sk-..."></label>
        <small id="server-key" class="hidden">A server key is configured; leave blank to use it.</small>
        <label>AI Model <select id="model"></select></label>
        <label>Creativity Level <span id="temp-value"></span>
            <input id="temperature" type="range" min="0" max="1" step="0.1">
        </label>
    </fieldset>

    <section>
        <h2>Upload Your Document</h2>
        <input id="file" type="file" accept=".pdf,.docx,.txt">
        <button id="extract">Extract Text from Document</button>
        <p id="upload-status"></p>
        <details id="preview-box" class="hidden">
            <summary>Preview Extracted Text (first 1000 characters)</summary>
            <pre id="preview"></pre>
        </details>
    </section>

    <section id="ask" class="hidden">
        <h2>Ask Your Question</h2>
        <textarea id="question" rows="4" placeholder="e.g., What are the main findings in this document?"></textarea>
        <button id="generate">Generate Insights</button>
        <p id="generate-status"></p>
    </section>

    <section id="result" class="hidden">
        <h2>Insights</h2>
        <div id="insight" class="insight"></div>
        <p>
            <a id="download-txt" href="#">Download as TXT</a> ·
            <a id="download-md" href="#">Download as MD</a>
        </p>
        <button id="reset">Analyze Another Document</button>
    </section>

    <script>
    const $ = (id) => document.getElementById(id);
    let sessionId = null;

    function show(id, visible) { $(id).classList.toggle("hidden", !visible); }
    function status(id, text, ok) { $(id).textContent = text; $(id).className = ok ? "ok" : "err"; }

    async function api(path, options = {}) {
        const res = await fetch(path, options);
        const body = res.headers.get("content-type")?.includes("json") ? await res.json() : null;
        if (!res.ok) throw new Error(body?.error ?? res.statusText);
        return body;
    }

    async function init() {
        const options = await api("/api/options");
        for (const m of options.models) {
            const opt = new Option(`${m.id} (${m.description})`, m.id);
            opt.selected = m.id === options.default_model;
            $("model").add(opt);
        }
        $("temperature").value = options.default_temperature;
        $("temp-value").textContent = options.default_temperature;
        show("server-key", options.server_credential);
        sessionId = (await api("/api/sessions", { method: "POST" })).id;
        $("download-txt").href = `/api/sessions/${sessionId}/export?format=txt`;
        $("download-md").href = `/api/sessions/${sessionId}/export?format=md`;
    }

    $("temperature").addEventListener("input", (e) => { $("temp-value").textContent = e.target.value; });

    $("extract").addEventListener("click", async () => {
        const file = $("file").files[0];
        if (!file) { status("upload-status", "Please choose a file to upload.", false); return; }
        const form = new FormData();
        form.append("file", file);
        status("upload-status", "Extracting text...", true);
        show("result", false);
        try {
            const doc = await api(`/api/sessions/${sessionId}/document`, { method: "POST", body: form });
            status("upload-status", `Text extracted from ${doc.filename} (${doc.size_kb.toFixed(2)} KB, ${doc.char_count} characters)`, true);
            $("preview").textContent = doc.preview;
            show("preview-box", true);
            show("ask", true);
        } catch (e) {
            status("upload-status", e.message, false);
            show("preview-box", false);
            show("ask", false);
        }
    });

    $("generate").addEventListener("click", async () => {
        status("generate-status", "Analyzing your document... This may take 10-30 seconds.", true);
        $("generate").disabled = true;
        try {
            const record = await api(`/api/sessions/${sessionId}/insights`, {
                method: "POST",
                headers: { "content-type": "application/json" },
                body: JSON.stringify({
                    question: $("question").value,
                    api_key: $("api-key").value || null,
                    model: $("model").value,
                    temperature: Number($("temperature").value),
                }),
            });
            status("generate-status", "", true);
            $("insight").textContent = record.insight;
            show("result", true);
        } catch (e) {
            status("generate-status", e.message, false);
        } finally {
            $("generate").disabled = false;
        }
    });

    $("reset").addEventListener("click", async () => {
        await api(`/api/sessions/${sessionId}/reset`, { method: "POST" });
        $("file").value = "";
        $("question").value = "";
        $("upload-status").textContent = "";
        ["preview-box", "ask", "result"].forEach((id) => show(id, false));
    });

    init().catch((e) => status("upload-status", e.message, false));
    </script>
</body>
</html>
"##;
