use super::{Capabilities, CryptoEngine, CryptoProvider, KeyPairIds};
use crate::algorithm::{CipherAlgorithm, HashAlgorithm, KeyPurpose, KeyRole, SignatureAlgorithm};
use crate::envelope::{MAX_PASSWORD_ITERATIONS, PasswordEnvelope, SALT_LEN, SymmetricEnvelope};
use crate::error::CryptoError;
use crate::keys::{KEY_NAMESPACE, KeyAttributes, KeyEntry, KeyMaterial, sanitize};
use crate::logging::Operation;
use crate::metadata::{self, MetadataExt, kind};
use crate::options::EncryptionOptions;
use crate::primitives::{aead, digest, kdf, random, signature};
use bastion_kernel::safe_nanoid;
use bastion_logger::LogMetadata;
use bastion_storage::{Metadata, SecureStorage};
use std::str::FromStr;
use zeroize::Zeroizing;

/// Upper bound for `generate_key`.
pub const MAX_KEY_LEN: usize = 1024;

const PASSWORD_FAILURE: &str = "incorrect password or corrupted data";

impl<S: SecureStorage + Clone> CryptoProvider<S> {
    fn op(&self, name: &'static str, metadata: LogMetadata) -> Operation<'_> {
        Operation::start(self.inner.logger.as_ref(), name, metadata.public("provider", self.kind()))
    }

    async fn load_data(&self, id: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let id = object_id(id)?;
        match self.inner.storage.retrieve(id).await {
            Ok(bytes) => Ok(Zeroizing::new(bytes)),
            Err(err) if err.is_not_found() => Err(CryptoError::data_not_found(id)),
            Err(err) => Err(err.into()),
        }
    }

    async fn load_metadata(&self, id: &str) -> Result<Metadata, CryptoError> {
        let id = object_id(id)?;
        match self.inner.storage.metadata(id).await {
            Ok(meta) => Ok(meta),
            Err(err) if err.is_not_found() => Err(CryptoError::data_not_found(id)),
            Err(err) => Err(err.into()),
        }
    }

    async fn load_aad(&self, aad_id: Option<&str>) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        match aad_id {
            Some(id) => self.load_data(id).await,
            None => Ok(Zeroizing::new(Vec::new())),
        }
    }

    async fn key_entry(&self, key_id: &str) -> Result<KeyEntry, CryptoError> {
        let id = sanitize(key_id)?;
        self.inner.keys.get_entry(&id).await?.ok_or_else(|| CryptoError::key_not_found(&id))
    }

    /// Raw bytes of a software key; hardware keys cannot feed HMAC or HKDF.
    async fn raw_key(
        &self,
        key_id: &str,
        operation: &str,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        match self.key_entry(key_id).await?.material {
            KeyMaterial::Raw(bytes) => Ok(bytes),
            KeyMaterial::Hardware(_) => Err(CryptoError::unsupported_operation(format!(
                "{operation} is not available for hardware-resident keys"
            ))),
        }
    }

    async fn put(
        &self,
        prefix: &str,
        options: &EncryptionOptions,
        bytes: &[u8],
        meta: Metadata,
    ) -> Result<String, CryptoError> {
        let id = match &options.output_id {
            Some(id) => object_id(id)?.to_owned(),
            None => format!("{prefix}/{}", safe_nanoid!()),
        };
        self.inner.storage.store(&id, bytes, meta).await?;
        Ok(id)
    }

    fn cipher_for(
        &self,
        requested: Option<CipherAlgorithm>,
    ) -> Result<CipherAlgorithm, CryptoError> {
        let caps = &self.inner.capabilities;
        let cipher = requested.unwrap_or(caps.default_cipher);
        if caps.supports_cipher(cipher) {
            Ok(cipher)
        } else {
            Err(CryptoError::unsupported_algorithm(format!(
                "{cipher} is not offered by the {} provider",
                caps.kind
            )))
        }
    }

    fn hash_for(&self, hash: HashAlgorithm) -> Result<HashAlgorithm, CryptoError> {
        let caps = &self.inner.capabilities;
        if caps.supports_hash(hash) {
            Ok(hash)
        } else {
            Err(CryptoError::unsupported_algorithm(format!(
                "{hash} is not offered by the {} provider",
                caps.kind
            )))
        }
    }

    fn signature_for(
        &self,
        algorithm: SignatureAlgorithm,
    ) -> Result<SignatureAlgorithm, CryptoError> {
        let caps = &self.inner.capabilities;
        if caps.supports_signature(algorithm) {
            Ok(algorithm)
        } else {
            Err(CryptoError::unsupported_algorithm(format!(
                "{algorithm} is not offered by the {} provider",
                caps.kind
            )))
        }
    }

    /// Hardware is used when requested and attached; otherwise `allow_fallback` decides
    /// between software keys and a hard failure.
    fn hardware_or_fallback(&self, requested: bool, servable: bool) -> Result<bool, CryptoError> {
        if !requested {
            return Ok(false);
        }
        if servable && self.inner.hardware.is_some() {
            return Ok(true);
        }
        if self.inner.allow_fallback {
            tracing::debug!("Hardware request served by software keys");
            Ok(false)
        } else {
            Err(CryptoError::unsupported_operation(
                "hardware-backed key generation is not available",
            ))
        }
    }

    fn keyring(&self) -> Result<&super::HardwareKeyring, CryptoError> {
        self.inner
            .hardware
            .as_ref()
            .ok_or_else(|| CryptoError::unsupported_operation("no hardware boundary is attached"))
    }

    /// Persists freshly generated material, releasing its hardware slot if the write fails.
    async fn store_generated(
        &self,
        id: &str,
        material: &KeyMaterial,
        attributes: &KeyAttributes,
    ) -> Result<String, CryptoError> {
        let stored = self.inner.keys.store_material(id, material, attributes).await;
        if let (Err(_), KeyMaterial::Hardware(reference)) = (&stored, material) {
            self.keyring()?.destroy(reference);
        }
        stored
    }

    fn seal_with(
        &self,
        material: &KeyMaterial,
        cipher: CipherAlgorithm,
        nonce: &[u8; aead::NONCE_LEN],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        match material {
            KeyMaterial::Raw(key) => aead::seal(cipher, key, nonce, plaintext, aad),
            KeyMaterial::Hardware(reference) => {
                self.keyring()?.seal(reference, cipher, nonce, plaintext, aad)
            },
        }
    }

    fn open_with(
        &self,
        material: &KeyMaterial,
        cipher: CipherAlgorithm,
        envelope: &SymmetricEnvelope,
        aad: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        match material {
            KeyMaterial::Raw(key) => {
                aead::open(cipher, key, &envelope.nonce, &envelope.sealed, aad)
            },
            KeyMaterial::Hardware(reference) => {
                self.keyring()?.open(reference, cipher, &envelope.nonce, &envelope.sealed, aad)
            },
        }
    }

    async fn password_key(
        password: &str,
        salt: [u8; SALT_LEN],
        iterations: u32,
    ) -> Result<Zeroizing<[u8; kdf::PBKDF2_KEY_LEN]>, CryptoError> {
        let password = Zeroizing::new(password.as_bytes().to_vec());
        tokio::task::spawn_blocking(move || kdf::pbkdf2_sha256(&password, &salt, iterations))
            .await
            .map_err(|e| CryptoError::KeyDerivationFailed {
                message: e.to_string().into(),
                context: Some("PBKDF2 task".into()),
            })
    }

    fn signature_algorithm(entry: &KeyEntry) -> Result<SignatureAlgorithm, CryptoError> {
        let name = entry
            .attributes
            .algorithm
            .as_deref()
            .ok_or_else(|| CryptoError::invalid_input("key carries no signature algorithm"))?;
        SignatureAlgorithm::from_str(name).map_err(|_| {
            CryptoError::data_corrupted(format!("unknown signature algorithm {name:?}"))
        })
    }

    async fn decrypt_inner(
        &self,
        encrypted_id: &str,
        key_id: Option<&str>,
        options: &EncryptionOptions,
    ) -> Result<String, CryptoError> {
        let blob = self.load_data(encrypted_id).await?;
        let meta = self.load_metadata(encrypted_id).await?;

        let stored_cipher = match meta.get(metadata::ALGORITHM) {
            Some(name) => Some(
                CipherAlgorithm::from_str(name)
                    .map_err(|_| CryptoError::data_corrupted(format!("unknown cipher {name:?}")))?,
            ),
            None => None,
        };
        let cipher = self.cipher_for(options.algorithm.or(stored_cipher))?;
        let aad_id =
            options.aad_id.as_deref().or_else(|| meta.get(metadata::AAD_ID).map(String::as_str));

        let (envelope, entry) = match key_id {
            Some(key_id) => {
                let key_id = sanitize(key_id)?;
                let envelope = SymmetricEnvelope::decode_for_key(&blob, &key_id)?;
                (envelope, self.key_entry(&key_id).await?)
            },
            None => self.resolve_embedded(&blob).await?,
        };

        let aad = self.load_aad(aad_id).await?;
        let plaintext = self.open_with(&entry.material, cipher, &envelope, &aad)?;

        let meta = metadata::record(kind::PLAINTEXT)
            .with(metadata::DATA_ID, encrypted_id)
            .with(metadata::KEY_ID, &entry.id);
        self.put("decrypted", options, &plaintext, meta).await
    }

    /// First trailer candidate whose key exists.
    async fn resolve_embedded(
        &self,
        blob: &[u8],
    ) -> Result<(SymmetricEnvelope, KeyEntry), CryptoError> {
        for candidate in SymmetricEnvelope::candidates(blob)? {
            let Some(id) = candidate.key_id.as_deref() else { continue };
            if let Some(entry) = self.inner.keys.get_entry(id).await? {
                return Ok((candidate, entry));
            }
        }
        Err(CryptoError::KeyNotFound { message: "embedded key identifier".into(), context: None })
    }
}

impl<S: SecureStorage + Clone> CryptoEngine for CryptoProvider<S> {
    async fn encrypt(
        &self,
        data_id: &str,
        key_id: &str,
        options: &EncryptionOptions,
    ) -> Result<String, CryptoError> {
        let op = self.op(
            "encrypt",
            LogMetadata::new().private("data_id", data_id).private("key_id", key_id),
        );
        let result = async {
            let key_id = sanitize(key_id)?;
            let cipher = self.cipher_for(options.algorithm)?;
            let plaintext = self.load_data(data_id).await?;
            let aad = self.load_aad(options.aad_id.as_deref()).await?;
            let entry = self.key_entry(&key_id).await?;

            let nonce = random::array::<{ aead::NONCE_LEN }>()?;
            let sealed = self.seal_with(&entry.material, cipher, &nonce, &plaintext, &aad)?;
            let embedded = options.embed_key_id.then(|| key_id.clone());
            let blob = SymmetricEnvelope::new(nonce, sealed, embedded).encode()?;

            let mut meta = metadata::record(kind::CIPHERTEXT)
                .with(metadata::ALGORITHM, cipher)
                .with(metadata::KEY_ID, &key_id)
                .with(metadata::DATA_ID, data_id);
            if let Some(aad_id) = &options.aad_id {
                meta.insert(metadata::AAD_ID.to_owned(), aad_id.clone());
            }
            self.put("encrypted", options, &blob, meta).await
        };
        op.finish(result.await)
    }

    async fn decrypt(
        &self,
        encrypted_id: &str,
        key_id: Option<&str>,
        options: &EncryptionOptions,
    ) -> Result<String, CryptoError> {
        let mut log = LogMetadata::new().private("encrypted_id", encrypted_id);
        if let Some(key_id) = key_id {
            log = log.private("key_id", key_id);
        }
        let op = self.op("decrypt", log);
        op.finish(self.decrypt_inner(encrypted_id, key_id, options).await)
    }

    async fn encrypt_with_password(
        &self,
        data_id: &str,
        password: &str,
        options: &EncryptionOptions,
    ) -> Result<String, CryptoError> {
        let op = self.op("encrypt_with_password", LogMetadata::new().private("data_id", data_id));
        let result = async {
            if password.is_empty() {
                return Err(CryptoError::invalid_input("password is empty"));
            }
            let floor = self.inner.password_iterations;
            let iterations = options.iterations.unwrap_or(floor).max(floor);
            if iterations > MAX_PASSWORD_ITERATIONS {
                return Err(CryptoError::invalid_input(format!(
                    "iteration count above {MAX_PASSWORD_ITERATIONS}"
                )));
            }
            let plaintext = self.load_data(data_id).await?;

            let salt = random::array::<SALT_LEN>()?;
            let nonce = random::array::<{ aead::NONCE_LEN }>()?;
            let key = Self::password_key(password, salt, iterations).await?;
            let sealed = aead::seal(CipherAlgorithm::Aes256Gcm, &key[..], &nonce, &plaintext, &[])?;
            let blob = PasswordEnvelope { salt, nonce, iterations, sealed }.encode();

            let meta = metadata::record(kind::PASSWORD_CIPHERTEXT)
                .with(metadata::ALGORITHM, CipherAlgorithm::Aes256Gcm)
                .with(metadata::DATA_ID, data_id);
            self.put("encrypted", options, &blob, meta).await
        };
        op.finish(result.await)
    }

    async fn decrypt_with_password(
        &self,
        encrypted_id: &str,
        password: &str,
        options: &EncryptionOptions,
    ) -> Result<String, CryptoError> {
        let op = self.op(
            "decrypt_with_password",
            LogMetadata::new().private("encrypted_id", encrypted_id),
        );
        let result = async {
            if password.is_empty() {
                return Err(CryptoError::invalid_input("password is empty"));
            }
            let blob = self.load_data(encrypted_id).await?;
            let envelope = PasswordEnvelope::decode(&blob)?;

            let key = Self::password_key(password, envelope.salt, envelope.iterations).await?;
            let (nonce, sealed) = (&envelope.nonce, &envelope.sealed);
            let plaintext = aead::open(CipherAlgorithm::Aes256Gcm, &key[..], nonce, sealed, &[])
                .map_err(|_| CryptoError::authentication_failed(PASSWORD_FAILURE))?;

            let meta = metadata::record(kind::PLAINTEXT).with(metadata::DATA_ID, encrypted_id);
            self.put("decrypted", options, &plaintext, meta).await
        };
        op.finish(result.await)
    }

    async fn hash(
        &self,
        data_id: &str,
        options: &EncryptionOptions,
    ) -> Result<String, CryptoError> {
        let algorithm = options.hash_or_default();
        let op = self.op(
            "hash",
            LogMetadata::new().private("data_id", data_id).public("algorithm", algorithm),
        );
        let result = async {
            let algorithm = self.hash_for(algorithm)?;
            let data = self.load_data(data_id).await?;
            let digest = digest::digest(algorithm, &data);

            let meta = metadata::record(kind::DIGEST)
                .with(metadata::ALGORITHM, algorithm)
                .with(metadata::DATA_ID, data_id);
            self.put("digests", options, &digest, meta).await
        };
        op.finish(result.await)
    }

    async fn verify_hash(
        &self,
        data_id: &str,
        hash_id: &str,
        options: &EncryptionOptions,
    ) -> Result<bool, CryptoError> {
        let op = self.op(
            "verify_hash",
            LogMetadata::new().private("data_id", data_id).private("hash_id", hash_id),
        );
        let result = async {
            let expected = self.load_data(hash_id).await?;
            let algorithm = match options.hash_algorithm {
                Some(algorithm) => algorithm,
                None => stored_hash(&self.load_metadata(hash_id).await?)?,
            };
            let algorithm = self.hash_for(algorithm)?;
            let data = self.load_data(data_id).await?;
            let actual = digest::digest(algorithm, &data);
            Ok::<_, CryptoError>(digest::constant_time_eq(&actual, &expected))
        };
        op.finish(result.await)
    }

    async fn compute_hmac(
        &self,
        data_id: &str,
        key_id: &str,
        options: &EncryptionOptions,
    ) -> Result<String, CryptoError> {
        let op = self.op(
            "compute_hmac",
            LogMetadata::new().private("data_id", data_id).private("key_id", key_id),
        );
        let result = async {
            let key_id = sanitize(key_id)?;
            let algorithm = self.hash_for(options.hash_or_default())?;
            let data = self.load_data(data_id).await?;
            let key = self.raw_key(&key_id, "HMAC").await?;
            let mac = digest::hmac(algorithm, &key, &data)?;

            let meta = metadata::record(kind::HMAC)
                .with(metadata::ALGORITHM, algorithm)
                .with(metadata::KEY_ID, &key_id)
                .with(metadata::DATA_ID, data_id);
            self.put("macs", options, &mac, meta).await
        };
        op.finish(result.await)
    }

    async fn verify_hmac(
        &self,
        data_id: &str,
        hmac_id: &str,
        key_id: &str,
        options: &EncryptionOptions,
    ) -> Result<bool, CryptoError> {
        let op = self.op(
            "verify_hmac",
            LogMetadata::new()
                .private("data_id", data_id)
                .private("hmac_id", hmac_id)
                .private("key_id", key_id),
        );
        let result = async {
            let expected = self.load_data(hmac_id).await?;
            let algorithm = match options.hash_algorithm {
                Some(algorithm) => algorithm,
                None => stored_hash(&self.load_metadata(hmac_id).await?)?,
            };
            let algorithm = self.hash_for(algorithm)?;
            let data = self.load_data(data_id).await?;
            let key = self.raw_key(key_id, "HMAC").await?;
            let actual = digest::hmac(algorithm, &key, &data)?;
            Ok::<_, CryptoError>(digest::constant_time_eq(&actual, &expected))
        };
        op.finish(result.await)
    }

    async fn generate_key(
        &self,
        length: usize,
        key_id: &str,
        purpose: KeyPurpose,
        options: &EncryptionOptions,
    ) -> Result<bool, CryptoError> {
        let op = self.op(
            "generate_key",
            LogMetadata::new()
                .private("key_id", key_id)
                .public("length", length)
                .public("purpose", purpose),
        );
        let result = async {
            let key_id = sanitize(key_id)?;
            if length == 0 || length > MAX_KEY_LEN {
                return Err(CryptoError::invalid_input(format!(
                    "key length must be within 1..={MAX_KEY_LEN}"
                )));
            }

            let servable = length == CipherAlgorithm::KEY_LEN;
            let use_hardware = self.hardware_or_fallback(options.use_hardware, servable)?;
            let material = if use_hardware {
                KeyMaterial::Hardware(self.keyring()?.generate_symmetric()?)
            } else {
                KeyMaterial::Raw(random::secret(length)?)
            };
            self.store_generated(&key_id, &material, &KeyAttributes::new(purpose)).await?;
            Ok(true)
        };
        op.finish(result.await)
    }

    async fn derive_key(
        &self,
        master_key_id: &str,
        salt: Option<&[u8]>,
        info: Option<&[u8]>,
        output_length: usize,
        options: &EncryptionOptions,
    ) -> Result<String, CryptoError> {
        let op = self.op(
            "derive_key",
            LogMetadata::new()
                .private("master_key_id", master_key_id)
                .public("length", output_length),
        );
        let result = async {
            if output_length == 0 {
                return Err(CryptoError::invalid_input("derived key length is zero"));
            }
            let algorithm = self.hash_for(options.hash_or_default())?;
            let master = self.raw_key(master_key_id, "key derivation").await?;
            let okm = kdf::hkdf(algorithm, &master, salt, info.unwrap_or_default(), output_length)?;

            let id =
                options.output_id.clone().unwrap_or_else(|| format!("derived_{}", safe_nanoid!()));
            let attributes = KeyAttributes::new(KeyPurpose::General);
            self.inner.keys.store_material(&id, &KeyMaterial::Raw(okm), &attributes).await
        };
        op.finish(result.await)
    }

    async fn generate_signature_key_pair(
        &self,
        algorithm: SignatureAlgorithm,
        use_hardware_if_available: bool,
        options: &EncryptionOptions,
    ) -> Result<KeyPairIds, CryptoError> {
        let op = self.op(
            "generate_signature_key_pair",
            LogMetadata::new().public("algorithm", algorithm),
        );
        let result = async {
            let algorithm = self.signature_for(algorithm)?;
            let base = options
                .output_id
                .clone()
                .unwrap_or_else(|| format!("signing_{}", safe_nanoid!()));
            let private_id = sanitize(&format!("{base}_private"))?;
            let public_id = sanitize(&format!("{base}_public"))?;

            let use_hardware = self.hardware_or_fallback(
                use_hardware_if_available,
                algorithm == SignatureAlgorithm::EcdsaP256,
            )?;
            let (public, private) = if use_hardware {
                let (reference, public) = self.keyring()?.generate_p256()?;
                (public, KeyMaterial::Hardware(reference))
            } else {
                let pair = signature::generate(algorithm)?;
                (pair.public, KeyMaterial::Raw(pair.private))
            };

            let attributes = KeyAttributes::new(KeyPurpose::Signing)
                .algorithm(algorithm)
                .fingerprint(signature::fingerprint(&public));
            let keys = &self.inner.keys;

            let private_attributes = attributes.clone().role(KeyRole::Private);
            self.store_generated(&private_id, &private, &private_attributes).await?;

            let public_attributes = attributes.role(KeyRole::Public);
            let public = KeyMaterial::raw(public);
            let stored = keys.store_material(&public_id, &public, &public_attributes).await;
            if let Err(err) = stored {
                if let Err(cleanup) = keys.delete(&private_id).await {
                    tracing::warn!(error = %cleanup, "Orphaned private half of a failed key pair");
                }
                return Err(err);
            }
            Ok(KeyPairIds { public_id, private_id })
        };
        op.finish(result.await)
    }

    async fn sign_data(
        &self,
        data_id: &str,
        private_key_id: &str,
        options: &EncryptionOptions,
    ) -> Result<String, CryptoError> {
        let op = self.op(
            "sign_data",
            LogMetadata::new().private("data_id", data_id).private("key_id", private_key_id),
        );
        let result = async {
            let entry = self.key_entry(private_key_id).await?;
            if entry.attributes.role != Some(KeyRole::Private) {
                return Err(CryptoError::invalid_input("key is not a private signing key"));
            }
            let algorithm = self.signature_for(Self::signature_algorithm(&entry)?)?;
            let data = self.load_data(data_id).await?;

            let sig = match &entry.material {
                KeyMaterial::Raw(private) => signature::sign(algorithm, private, &data)?,
                KeyMaterial::Hardware(reference) => self.keyring()?.sign(reference, &data)?,
            };

            let mut meta = metadata::record(kind::SIGNATURE)
                .with(metadata::ALGORITHM, algorithm)
                .with(metadata::KEY_ID, &entry.id)
                .with(metadata::DATA_ID, data_id);
            if let Some(fingerprint) = &entry.attributes.fingerprint {
                meta.insert(metadata::KEY_FINGERPRINT.to_owned(), fingerprint.clone());
            }
            self.put("signatures", options, &sig, meta).await
        };
        op.finish(result.await)
    }

    async fn verify_signature(
        &self,
        signature_id: &str,
        data_id: &str,
        public_key_id: &str,
        _options: &EncryptionOptions,
    ) -> Result<bool, CryptoError> {
        let op = self.op(
            "verify_signature",
            LogMetadata::new()
                .private("signature_id", signature_id)
                .private("data_id", data_id)
                .private("key_id", public_key_id),
        );
        let result = async {
            let entry = self.key_entry(public_key_id).await?;
            if entry.attributes.role != Some(KeyRole::Public) {
                return Err(CryptoError::invalid_input("key is not a public verification key"));
            }
            let algorithm = self.signature_for(Self::signature_algorithm(&entry)?)?;
            let KeyMaterial::Raw(public) = &entry.material else {
                return Err(CryptoError::data_corrupted(
                    "public key is stored as a hardware reference",
                ));
            };

            let sig = self.load_data(signature_id).await?;
            let sig_meta = self.load_metadata(signature_id).await?;
            let recorded = sig_meta.get(metadata::ALGORITHM);
            if recorded.is_some_and(|name| *name != algorithm.to_string()) {
                return Ok(false);
            }
            let data = self.load_data(data_id).await?;
            signature::verify(algorithm, public, &data, &sig)
        };
        op.finish(result.await)
    }

    async fn export_public_key(&self, public_key_id: &str) -> Result<Vec<u8>, CryptoError> {
        let op = self.op("export_public_key", LogMetadata::new().private("key_id", public_key_id));
        let result = async {
            let entry = self.key_entry(public_key_id).await?;
            match (entry.attributes.role, entry.material) {
                (Some(KeyRole::Public), KeyMaterial::Raw(public)) => Ok(public.to_vec()),
                _ => Err(CryptoError::unsupported_operation("only public keys can be exported")),
            }
        };
        op.finish(result.await)
    }

    fn capabilities(&self) -> &Capabilities {
        &self.inner.capabilities
    }
}

/// Identifier of a stored object. Key blobs are reachable only through the key store.
fn object_id(id: &str) -> Result<&str, CryptoError> {
    if id.trim().is_empty() {
        return Err(CryptoError::invalid_input("object identifier is empty"));
    }
    if id.chars().any(char::is_control) {
        return Err(CryptoError::invalid_input("object identifier contains control characters"));
    }
    if id.starts_with(KEY_NAMESPACE) {
        return Err(CryptoError::invalid_input(format!(
            "object identifiers under {KEY_NAMESPACE:?} are reserved for keys"
        )));
    }
    Ok(id)
}

fn stored_hash(meta: &Metadata) -> Result<HashAlgorithm, CryptoError> {
    meta.get(metadata::ALGORITHM).map_or(Ok(HashAlgorithm::default()), |name| {
        HashAlgorithm::from_str(name)
            .map_err(|_| CryptoError::data_corrupted(format!("unknown digest {name:?}")))
    })
}
